pub mod csv_input;
pub mod cursor;
pub mod parser;

use crate::error::{MergeError, Result};
use crate::metadata::Layer;
use std::path::{Path, PathBuf};

/// The parsed description of a book: chapters, their files and tag overrides.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Tags declared in `[metadata]` sections. Applied last when merging.
    pub metadata: Layer,
    pub album_art: Option<PathBuf>,
    pub chapters: Vec<Chapter>,
    /// Every file of every chapter, in the order they were declared.
    pub files: Vec<FileRef>,
    root: PathBuf,
}

/// A named group of source files forming one timeline segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub name: String,
    pub files: Vec<FileRef>,
}

/// A source audio file. The duration stays empty until the file is probed.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRef {
    pub path: PathBuf,
    pub duration_seconds: Option<f64>,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            duration_seconds: None,
        }
    }
}

impl Chapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
        }
    }
}

impl Manifest {
    /// Create an empty manifest whose relative paths resolve against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path as written in a manifest against the root directory.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Find a chapter by name, appending an empty one if it doesn't exist yet.
    pub fn chapter_mut(&mut self, name: &str) -> &mut Chapter {
        let index = match self.chapters.iter().rposition(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.chapters.push(Chapter::new(name));
                self.chapters.len() - 1
            }
        };
        &mut self.chapters[index]
    }

    /// Append a file to the named chapter, creating the chapter on first use.
    pub fn add_file(&mut self, chapter: &str, raw: &str) {
        let file = FileRef::new(self.resolve(raw));
        self.chapter_mut(chapter).files.push(file.clone());
        self.files.push(file);
    }

    /// Merge chapters built elsewhere, concatenating files of chapters that share a name.
    pub fn merge_chapters(&mut self, chapters: Vec<Chapter>) {
        for chapter in chapters {
            self.files.extend(chapter.files.iter().cloned());
            self.chapter_mut(&chapter.name).files.extend(chapter.files);
        }
    }

    /// Set the cover art. An empty value clears it.
    pub fn set_album_art(&mut self, raw: &str) {
        self.album_art = if raw.is_empty() {
            None
        } else {
            Some(self.resolve(raw))
        };
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Parse one input file into `manifest`, choosing the CSV reader for `.csv` files.
pub fn parse_input(path: &Path, manifest: &mut Manifest) -> Result<()> {
    if !path.is_file() {
        return Err(MergeError::Config(format!(
            "File not found: {}",
            path.display()
        )));
    }
    if is_csv(path) {
        csv_input::parse_csv_file(path, manifest)
    } else {
        parser::parse_manifest_file(path, manifest)
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
