pub mod encode;
pub mod reattach;

use crate::error::{MergeError, Result};
use crate::ffmpeg::{DEFAULT_OUTPUT_FORMAT, Toolchain};
use crate::manifest::{self, Manifest};
use crate::metadata::{self, Layer, Tags, ffmetadata};
use crate::progress::Progress;
use crate::timing::{self, ChapterMarker};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Everything a merge run needs, resolved to absolute paths.
#[derive(Debug, Clone)]
pub struct MergeJob {
    /// Manifest or CSV files, parsed in order into one manifest.
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// Directory that relative paths inside the inputs resolve against.
    pub root: PathBuf,
    /// Only rewrite tags and chapters when the output already exists.
    pub update_only: bool,
    pub inherit_metadata: bool,
    pub default_metadata: bool,
    /// Probe and plan, but write nothing.
    pub dry_run: bool,
    pub format: String,
    pub tools: Toolchain,
}

impl MergeJob {
    pub fn new(inputs: Vec<PathBuf>, output: PathBuf, root: PathBuf) -> Self {
        Self {
            inputs,
            output,
            root,
            update_only: false,
            inherit_metadata: true,
            default_metadata: true,
            dry_run: false,
            format: DEFAULT_OUTPUT_FORMAT.to_string(),
            tools: Toolchain::default(),
        }
    }

    /// Book title used for default tags: the first input's file stem.
    pub fn title(&self) -> String {
        self.inputs
            .first()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Where a run is in the merge state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Probing,
    MetadataFileWritten,
    Encoding,
    Reattaching,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Probing => "probing",
            Stage::MetadataFileWritten => "metadata file written",
            Stage::Encoding => "encoding",
            Stage::Reattaching => "reattaching",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How the output was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    Encoded,
    Reattached,
    DryRun,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub output: PathBuf,
    pub mode: MergeMode,
    pub tags: Tags,
    pub chapters: Vec<ChapterMarker>,
    pub files: usize,
}

/// Parse every input, in order, into a single manifest.
pub fn load_manifest(inputs: &[PathBuf], root: &Path) -> Result<Manifest> {
    if inputs.is_empty() {
        return Err(MergeError::Config("Expected input filenames".to_string()));
    }
    let mut manifest = Manifest::new(root);
    for input in inputs {
        manifest::parse_input(input, &mut manifest)?;
    }
    if manifest.is_empty() {
        let names: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();
        return Err(MergeError::Config(format!(
            "No input files in {}",
            names.join(",")
        )));
    }
    info!(
        chapters = manifest.chapters.len(),
        files = manifest.files.len(),
        "manifest loaded"
    );
    Ok(manifest)
}

/// Layer source tags, cleanup, defaults and manifest tags into the final set.
pub fn build_tags(job: &MergeJob, manifest: &Manifest) -> Result<Tags> {
    let inherited = match manifest.files.first() {
        Some(first) if job.inherit_metadata => job.tools.read_tags(&first.path)?,
        _ => Layer::new(),
    };
    let defaults = if job.default_metadata {
        metadata::default_layer(&job.title())
    } else {
        Layer::new()
    };
    Ok(metadata::merge([
        &inherited,
        &metadata::cleanup_layer(),
        &defaults,
        &manifest.metadata,
    ]))
}

/// Run a merge end to end.
pub fn run(job: &MergeJob, progress: &mut dyn Progress) -> Result<MergeReport> {
    let mut stage = Stage::Idle;
    let result = execute(job, progress, &mut stage);
    match &result {
        Ok(_) => transition(&mut stage, Stage::Done),
        Err(err) => {
            warn!(stage = %stage, error = %err, "merge failed");
            transition(&mut stage, Stage::Failed);
        }
    }
    result
}

fn transition(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "stage");
    *stage = next;
}

fn execute(job: &MergeJob, progress: &mut dyn Progress, stage: &mut Stage) -> Result<MergeReport> {
    let manifest = load_manifest(&job.inputs, &job.root)?;

    // Cheap checks first.
    let album_art = manifest.album_art.as_deref();
    if let Some(art) = album_art
        && !art.is_file()
    {
        return Err(MergeError::Config(format!(
            "File not found: {}",
            art.display()
        )));
    }

    let tags = build_tags(job, &manifest)?;

    transition(stage, Stage::Probing);
    let chapters = timing::resolve_chapters(&manifest.chapters, &job.tools, progress)?;
    let markers = timing::chapter_markers(&chapters);

    let mut report = MergeReport {
        output: job.output.clone(),
        mode: MergeMode::DryRun,
        tags,
        chapters: markers,
        files: manifest.files.len(),
    };
    if job.dry_run {
        return Ok(report);
    }

    // Removed when it goes out of scope, whatever happens below.
    let mut scratch = sibling_temp_file(&job.output, ".txt")?;
    scratch.write_all(ffmetadata::render(&report.tags, &report.chapters).as_bytes())?;
    scratch.flush()?;
    transition(stage, Stage::MetadataFileWritten);

    if job.update_only && job.output.is_file() {
        transition(stage, Stage::Reattaching);
        reattach::reattach(&job.tools, scratch.path(), album_art, &job.output, &job.format)?;
        report.mode = MergeMode::Reattached;
    } else {
        transition(stage, Stage::Encoding);
        encode::encode(
            &job.tools,
            &chapters,
            scratch.path(),
            album_art,
            &job.output,
            &job.format,
            progress,
        )?;
        report.mode = MergeMode::Encoded;
    }

    info!(output = %job.output.display(), "merge complete");
    Ok(report)
}

/// Create `<dir>/<stem>XXXXXX.tmp<extension>` next to `path`.
pub(crate) fn sibling_temp_file(path: &Path, extension: &str) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file = tempfile::Builder::new()
        .prefix(&stem)
        .suffix(&format!(".tmp{extension}"))
        .tempfile_in(dir)?;
    Ok(file)
}
