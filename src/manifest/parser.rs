use super::Manifest;
use super::cursor::{LineCursor, LogicalLine, SectionLine};
use crate::error::{MergeError, Result};
use std::path::Path;
use tracing::debug;

/// Metadata keys that set the cover art instead of becoming a tag.
const ALBUM_ART_KEYS: [&str; 2] = ["album_art", "album_cover"];

/// Read a manifest file and add its sections to `manifest`.
pub fn parse_manifest_file(path: &Path, manifest: &mut Manifest) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(|e| MergeError::read(path, e))?;
    parse_manifest_str(&text, path, manifest)
}

/// Parse manifest text. `file` is only used in error messages.
///
/// ```text
/// [metadata]
/// artist = Someone
/// album_art = cover.jpg
///
/// [chapter: Opening]
/// disc1/01.mp3
/// disc1/02.mp3
/// ```
pub fn parse_manifest_str(text: &str, file: &Path, manifest: &mut Manifest) -> Result<()> {
    let mut parser = ManifestParser {
        file,
        cursor: LineCursor::new(text),
        manifest,
    };
    parser.parse_top_level()?;
    debug!(file = %file.display(), "parsed manifest");
    Ok(())
}

struct ManifestParser<'a, 'm> {
    file: &'a Path,
    cursor: LineCursor<'a>,
    manifest: &'m mut Manifest,
}

impl<'a> ManifestParser<'a, '_> {
    fn error(&self, line: LogicalLine<'_>, message: impl Into<String>) -> MergeError {
        MergeError::parse(self.file, line.number, message)
    }

    fn parse_top_level(&mut self) -> Result<()> {
        while let Some(line) = self.cursor.next_logical_line() {
            let (key, argument) = self.section_key(line)?;
            match key {
                "metadata" => {
                    if !argument.is_empty() {
                        return Err(self.error(
                            line,
                            format!("unexpected value \"{argument}\" for \"[metadata]\""),
                        ));
                    }
                    self.parse_metadata()?;
                }
                "chapter" => {
                    if argument.is_empty() {
                        return Err(self.error(line, "Expected [chapter: name]"));
                    }
                    self.parse_chapter(argument);
                }
                other => return Err(self.error(line, format!("Unexpected [{other}]"))),
            }
        }
        Ok(())
    }

    /// Split `[key]` or `[key: argument]` into trimmed parts.
    fn section_key(&self, line: LogicalLine<'a>) -> Result<(&'a str, &'a str)> {
        let inner = line
            .text
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| self.error(line, "Expected section key \"[key(: value)]\""))?;
        let (key, argument) = inner.split_once(':').unwrap_or((inner, ""));
        let key = key.trim();
        if key.is_empty() {
            return Err(self.error(line, "Expected [key]"));
        }
        Ok((key, argument.trim()))
    }

    fn parse_metadata(&mut self) -> Result<()> {
        while let SectionLine::Entry(line) = self.cursor.next_entry() {
            let (key, value) = line.text.split_once('=').unwrap_or((line.text, ""));
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(self.error(line, "Expected: metadata key"));
            }
            if ALBUM_ART_KEYS.contains(&key) {
                self.manifest.set_album_art(value);
            } else {
                self.manifest.metadata.set(key, value);
            }
        }
        Ok(())
    }

    fn parse_chapter(&mut self, name: &str) {
        // Registers the chapter even when the section lists no files.
        self.manifest.chapter_mut(name);
        while let SectionLine::Entry(line) = self.cursor.next_entry() {
            self.manifest.add_file(name, line.text);
        }
    }
}
