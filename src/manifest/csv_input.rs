use super::{Chapter, FileRef, Manifest};
use crate::error::{MergeError, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read a `path,chapter_name` CSV file and merge its chapters into `manifest`.
pub fn parse_csv_file(path: &Path, manifest: &mut Manifest) -> Result<()> {
    let file = std::fs::File::open(path).map_err(|e| MergeError::read(path, e))?;
    parse_csv_reader(file, path, manifest)
}

/// Parse CSV rows from any reader. `file` is only used in error messages.
pub fn parse_csv_reader<R: Read>(reader: R, file: &Path, manifest: &mut Manifest) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .quote(b'"')
        .from_reader(reader);

    let mut chapters: Vec<Chapter> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for record in reader.records() {
        let record = record.map_err(|e| record_error(file, e))?;
        match (record.get(0), record.get(1)) {
            (Some(path), Some(name)) => {
                let index = *by_name.entry(name.to_string()).or_insert_with(|| {
                    chapters.push(Chapter::new(name));
                    chapters.len() - 1
                });
                chapters[index].files.push(FileRef::new(manifest.resolve(path)));
            }
            (Some(_), None) => {
                let line = record.position().map_or(0, |p| p.line() as usize);
                let row: Vec<&str> = record.iter().collect();
                return Err(MergeError::parse(
                    file,
                    line,
                    format!("Expected <filename>,<chapter>: {row:?}"),
                ));
            }
            _ => {}
        }
    }

    debug!(file = %file.display(), chapters = chapters.len(), "parsed CSV");
    manifest.merge_chapters(chapters);
    Ok(())
}

fn record_error(file: &Path, err: csv::Error) -> MergeError {
    let line = err.position().map_or(0, |p| p.line() as usize);
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => MergeError::read(file, e),
        _ => MergeError::parse(file, line, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(text: &str, manifest: &mut Manifest) -> Result<()> {
        parse_csv_reader(text.as_bytes(), Path::new("book.csv"), manifest)
    }

    #[test]
    fn test_rows_group_into_chapters() {
        let mut manifest = Manifest::new("/book");
        parse("a.mp3,Ch1\nb.mp3,Ch1\nc.mp3,Ch2\n", &mut manifest).unwrap();

        assert_eq!(manifest.chapters.len(), 2);
        assert_eq!(manifest.chapters[0].name, "Ch1");
        assert_eq!(
            manifest.chapters[0].files,
            vec![
                FileRef::new("/book/a.mp3"),
                FileRef::new("/book/b.mp3"),
            ]
        );
        assert_eq!(manifest.chapters[1].name, "Ch2");
        assert_eq!(manifest.chapters[1].files, vec![FileRef::new("/book/c.mp3")]);
        assert_eq!(manifest.files.len(), 3);
    }

    #[test]
    fn test_interleaved_rows_keep_first_seen_order() {
        let mut manifest = Manifest::new("/book");
        parse("a.mp3,B\nb.mp3,A\nc.mp3,B\n", &mut manifest).unwrap();
        let names: Vec<_> = manifest.chapters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(manifest.chapters[0].files.len(), 2);
        // flattened order follows chapters, not rows
        assert_eq!(manifest.files[1].path, PathBuf::from("/book/c.mp3"));
    }

    #[test]
    fn test_single_field_row_is_an_error() {
        let mut manifest = Manifest::new("/book");
        let err = parse("a.mp3,Ch1\nlonely.mp3\n", &mut manifest).unwrap_err();
        match err {
            MergeError::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("lonely.mp3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8_names_file_and_line() {
        let mut manifest = Manifest::new("/book");
        let bytes: &[u8] = b"a.mp3,Ch1\nb\xff.mp3,Ch1\n";
        let err = parse_csv_reader(bytes, Path::new("book.csv"), &mut manifest).unwrap_err();
        assert!(matches!(err, MergeError::Parse { line: 2, .. }));
        assert!(err.to_string().starts_with("book.csv(2): "));
    }

    #[test]
    fn test_blank_lines_ignored_and_quotes_honoured() {
        let mut manifest = Manifest::new("/book");
        parse("\n\"my, file.mp3\",\"Chapter, One\"\n\n", &mut manifest).unwrap();
        assert_eq!(manifest.chapters[0].name, "Chapter, One");
        assert_eq!(
            manifest.chapters[0].files[0].path,
            PathBuf::from("/book/my, file.mp3")
        );
    }

    #[test]
    fn test_merges_with_existing_chapters() {
        let mut manifest = Manifest::new("/book");
        manifest.add_file("Ch1", "first.mp3");
        parse("second.mp3,Ch1\n", &mut manifest).unwrap();
        assert_eq!(manifest.chapters.len(), 1);
        assert_eq!(manifest.chapters[0].files.len(), 2);
    }
}
