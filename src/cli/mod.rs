pub mod output;

use abmerge::ffmpeg::{DEFAULT_OUTPUT_FORMAT, Toolchain};
use abmerge::pipeline::MergeJob;
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "abmerge",
    version,
    about = "Merge a multi-file audiobook into one chaptered file"
)]
pub struct Cli {
    /// Manifest files, or CSV files listing <file>,<chapter>
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (default: <first input name>.m4b)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Update metadata only; don't process audio data
    #[arg(short, long)]
    pub update: bool,

    /// Don't apply the built-in default tags
    #[arg(long)]
    pub no_default_meta: bool,

    /// Don't inherit tags from the first input file
    #[arg(long)]
    pub no_inherit_meta: bool,

    /// Base directory for relative paths in manifests (default: first input's directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output container format
    #[arg(long, default_value = DEFAULT_OUTPUT_FORMAT)]
    pub format: String,

    /// Probe inputs and print the chapter plan without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// ffmpeg executable
    #[arg(long, env = "ABMERGE_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe executable
    #[arg(long, env = "ABMERGE_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: PathBuf,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Resolve paths and defaults into a merge job.
    pub fn to_job(&self) -> std::io::Result<MergeJob> {
        let inputs = self
            .inputs
            .iter()
            .map(std::path::absolute)
            .collect::<std::io::Result<Vec<_>>>()?;

        let output = match &self.output {
            Some(path) => path.clone(),
            None => PathBuf::from(format!("{}.m4b", stem(&inputs[0]))),
        };
        let output = std::path::absolute(output)?;

        let root = match &self.root {
            Some(root) => std::path::absolute(root)?,
            None => inputs[0]
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };

        let mut job = MergeJob::new(inputs, output, root);
        job.update_only = self.update;
        job.inherit_metadata = !self.no_inherit_meta;
        job.default_metadata = !self.no_default_meta;
        job.dry_run = self.dry_run;
        job.format = self.format.clone();
        job.tools = Toolchain {
            ffmpeg: self.ffmpeg.clone(),
            ffprobe: self.ffprobe.clone(),
        };
        Ok(job)
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string())
}
