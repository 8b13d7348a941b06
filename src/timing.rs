use crate::error::Result;
use crate::ffmpeg::Toolchain;
use crate::manifest::{Chapter, FileRef};
use crate::progress::Progress;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reports the duration of a source file.
pub trait Probe {
    fn duration_seconds(&self, path: &Path) -> Result<f64>;
}

impl Probe for Toolchain {
    fn duration_seconds(&self, path: &Path) -> Result<f64> {
        self.probe_duration(path)
    }
}

/// One chapter's position on the merged timeline, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterMarker {
    pub title: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub files: Vec<PathBuf>,
}

/// Probe every file, in chapter order, and return chapters with durations filled in.
///
/// The first failing probe aborts the whole pass.
pub fn resolve_chapters(
    chapters: &[Chapter],
    probe: &dyn Probe,
    progress: &mut dyn Progress,
) -> Result<Vec<Chapter>> {
    let total = chapters.iter().map(|c| c.files.len()).sum();
    progress.begin(total);

    let mut resolved = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        let mut files = Vec::with_capacity(chapter.files.len());
        for file in &chapter.files {
            progress.step(&format!("Analyzing {}", file.path.display()));
            let duration = probe.duration_seconds(&file.path)?;
            debug!(file = %file.path.display(), duration, "probed");
            files.push(FileRef {
                path: file.path.clone(),
                duration_seconds: Some(duration),
            });
        }
        resolved.push(Chapter {
            name: chapter.name.clone(),
            files,
        });
    }

    progress.finish();
    Ok(resolved)
}

/// Lay chapters back to back on a single timeline.
///
/// Offsets accumulate in seconds and are rounded to whole milliseconds per
/// marker, so the end of one chapter is always the start of the next.
pub fn chapter_markers(chapters: &[Chapter]) -> Vec<ChapterMarker> {
    let mut elapsed = 0.0_f64;
    let mut chapter_start = 0_u64;
    let mut markers = Vec::with_capacity(chapters.len());

    for chapter in chapters {
        elapsed += chapter
            .files
            .iter()
            .map(|f| f.duration_seconds.unwrap_or_default())
            .sum::<f64>();
        let chapter_end = (elapsed * 1000.0).round() as u64;

        markers.push(ChapterMarker {
            title: chapter.name.clone(),
            start_ms: chapter_start,
            end_ms: chapter_end,
            files: chapter.files.iter().map(|f| f.path.clone()).collect(),
        });
        chapter_start = chapter_end;
    }
    markers
}
