//! The `;FFMETADATA1` text format: global tags followed by `[CHAPTER]` blocks.

use super::{Layer, Tags};
use crate::error::{MergeError, Result};
use crate::timing::ChapterMarker;
use std::fmt::Write;
use std::path::Path;

pub const HEADER: &str = ";FFMETADATA1";

/// Characters that must be backslash-escaped in keys and values.
const SPECIAL: [char; 5] = ['=', ';', '#', '\\', '\n'];

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn unescape(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => plain.extend(chars.next()),
            c => plain.push(c),
        }
    }
    plain
}

/// Split at the first `=` that isn't escaped.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' => return (&line[..i], &line[i + 1..]),
            _ => {}
        }
    }
    (line, "")
}

/// Render tags and chapter markers as a metadata file body.
pub fn render(tags: &Tags, markers: &[ChapterMarker]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    for (key, value) in tags.iter() {
        let _ = writeln!(out, "{}={}", escape(key), escape(value));
    }

    for marker in markers {
        out.push_str("\n[CHAPTER]\n");
        out.push_str("TIMEBASE=1/1000\n");
        let _ = writeln!(out, "START={}", marker.start_ms);
        let _ = writeln!(out, "END={}", marker.end_ms);
        let _ = writeln!(out, "title={}", escape(&marker.title));
    }
    out
}

/// Split into entries at newlines that aren't escaped, so multi-line values stay whole.
fn entries(text: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '\n' => {
                entries.push(text[start..i].strip_suffix('\r').unwrap_or(&text[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        entries.push(&text[start..]);
    }
    entries
}

/// Parse the global section of a metadata dump into a layer.
///
/// `source` is the file the dump describes; it is only used in errors.
pub fn parse(text: &str, source: &Path) -> Result<Layer> {
    let mut lines = entries(text).into_iter();
    let header = lines.next().unwrap_or_default();
    if header.trim_end() != HEADER {
        return Err(MergeError::Probe {
            file: source.to_path_buf(),
            message: format!("Unknown metadata format: \"{header}\""),
        });
    }

    let mut layer = Layer::new();
    for line in lines {
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        // Per-stream and chapter sections aren't inherited.
        if line.starts_with('[') {
            break;
        }
        let (key, value) = split_entry(line);
        let key = unescape(key.trim());
        if key.is_empty() {
            continue;
        }
        // Values are taken verbatim; escaped trailing whitespace is significant.
        layer.set(key, unescape(value));
    }
    Ok(layer)
}
