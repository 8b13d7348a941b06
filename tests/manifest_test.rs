mod common;

use abmerge::manifest::{Manifest, parse_input};
use common::Book;
use predicates::prelude::*;

// Tools that can't exist: these runs must fail before any subprocess is started.
const NO_TOOL: &str = "/nonexistent/abmerge-test-tool";

#[test]
fn test_parse_error_reports_file_and_line() {
    let _guard = common::lock();
    let book = Book::new();
    let manifest = book.write("book.txt", "[metadata]\ntitle = X\n\n[bogus]\na.mp3\n");

    common::abmerge()
        .arg(&manifest)
        .args(["--ffmpeg", NO_TOOL, "--ffprobe", NO_TOOL])
        .assert()
        .failure()
        .stderr(predicate::str::contains("book.txt(4): Unexpected [bogus]"));
}

#[test]
fn test_csv_single_field_row_fails() {
    let _guard = common::lock();
    let book = Book::new();
    let csv = book.write("book.csv", "a.mp3,One\nb.mp3\n");

    common::abmerge()
        .arg(&csv)
        .args(["--ffmpeg", NO_TOOL, "--ffprobe", NO_TOOL])
        .assert()
        .failure()
        .stderr(predicate::str::contains("book.csv(2)"));
}

#[test]
fn test_non_utf8_inputs_name_the_file() {
    let _guard = common::lock();
    let book = Book::new();
    let manifest = book.path("latin1.txt");
    std::fs::write(&manifest, b"[chapter: Caf\xe9]\na.mp3\n").unwrap();
    let csv = book.path("latin1.csv");
    std::fs::write(&csv, b"a.mp3,Caf\xe9\n").unwrap();

    common::abmerge()
        .arg(&manifest)
        .args(["--ffmpeg", NO_TOOL, "--ffprobe", NO_TOOL])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"))
        .stderr(predicate::str::contains("latin1.txt"));

    common::abmerge()
        .arg(&csv)
        .args(["--ffmpeg", NO_TOOL, "--ffprobe", NO_TOOL])
        .assert()
        .failure()
        .stderr(predicate::str::contains("latin1.csv(1)"));
}

#[test]
fn test_missing_album_art_is_checked_first() {
    let _guard = common::lock();
    let book = Book::new();
    let manifest = book.write(
        "book.txt",
        "[metadata]\nalbum_cover = missing.jpg\n[chapter: One]\na.mp3\n",
    );

    common::abmerge()
        .arg(&manifest)
        .args(["--ffmpeg", NO_TOOL, "--ffprobe", NO_TOOL])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"))
        .stderr(predicate::str::contains("missing.jpg"));
}

#[test]
fn test_manifest_without_files_fails() {
    let _guard = common::lock();
    let book = Book::new();
    let manifest = book.write("book.txt", "[metadata]\nartist = Nobody\n");

    common::abmerge()
        .arg(&manifest)
        .args(["--ffmpeg", NO_TOOL, "--ffprobe", NO_TOOL])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No input files in"));
}

#[test]
fn test_missing_input_fails() {
    let _guard = common::lock();
    let book = Book::new();

    common::abmerge()
        .arg(book.path("nope.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_missing_tool_is_reported() {
    let _guard = common::lock();
    let book = Book::new();
    let manifest = book.write("book.txt", "[chapter: One]\na.mp3\n");

    common::abmerge()
        .arg(&manifest)
        .args(["--ffmpeg", NO_TOOL, "--ffprobe", NO_TOOL])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_split_manifests_merge_chapters() {
    let book = Book::new();
    let disc1 = book.write("disc1.txt", "[chapter: Part One]\ndisc1/01.mp3\n");
    let disc2 = book.write(
        "disc2.txt",
        "[chapter: Part One]\ndisc2/01.mp3\n[chapter: Part Two]\ndisc2/02.mp3\n",
    );

    let mut manifest = Manifest::new(book.dir.path());
    parse_input(&disc1, &mut manifest).unwrap();
    parse_input(&disc2, &mut manifest).unwrap();

    assert_eq!(manifest.chapters.len(), 2);
    assert_eq!(
        manifest.chapters[0].files[1].path,
        book.path("disc2/01.mp3")
    );
    assert_eq!(manifest.files.len(), 3);
}
