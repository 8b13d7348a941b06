#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that write and then execute scripts. A script being
/// written while another thread forks can fail to exec with ETXTBSY.
pub fn lock() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub fn abmerge() -> Command {
    Command::cargo_bin("abmerge").unwrap()
}

/// A temp directory holding a book: source "audio" files and stand-in tools.
pub struct Book {
    pub dir: tempfile::TempDir,
}

impl Book {
    pub fn new() -> Self {
        Self {
            dir: tempfile::TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, contents).expect("write file");
        path
    }

    /// A fake audio file. Its first line is the duration the fake ffprobe reports,
    /// and its whole content is the "PCM" the fake decoder emits.
    pub fn audio(&self, name: &str, seconds: &str) -> PathBuf {
        self.write(name, &format!("{seconds}\n"))
    }

    /// Names of all entries in the book directory, sorted.
    pub fn listing(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .expect("read dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[cfg(unix)]
    pub fn tools(&self, fail_writes: bool) -> (PathBuf, PathBuf) {
        let ffmpeg = write_script(&self.path("bin/ffmpeg"), &fake_ffmpeg(fail_writes));
        let ffprobe = write_script(&self.path("bin/ffprobe"), FAKE_FFPROBE);
        (ffmpeg, ffprobe)
    }

    /// An executable script under `bin/`.
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        write_script(&self.path(&format!("bin/{name}")), body)
    }
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(path.parent().unwrap()).expect("create bin dir");
    std::fs::write(path, body).expect("write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path.to_path_buf()
}

const FAKE_FFPROBE: &str = r#"#!/bin/sh
prev=""
file=""
for arg in "$@"; do
  if [ "$prev" = "-i" ]; then file="$arg"; fi
  prev="$arg"
done
head -n 1 "$file"
"#;

/// Decoding prints the file; encoding concatenates stdin and the metadata
/// input into the output; stream copy copies the first input and appends
/// the metadata input.
fn fake_ffmpeg(fail_writes: bool) -> String {
    let fail = if fail_writes {
        "echo 'No space left on device' >&2; exit 1"
    } else {
        ":"
    };
    format!(
        r#"#!/bin/sh
prev=""
first=""
second=""
format=""
last=""
for arg in "$@"; do
  if [ "$prev" = "-i" ]; then
    if [ -z "$first" ]; then first="$arg"; elif [ -z "$second" ]; then second="$arg"; fi
  fi
  if [ "$prev" = "-f" ]; then format="$arg"; fi
  prev="$arg"
  last="$arg"
done
if [ "$format" = "ffmetadata" ]; then
  printf ';FFMETADATA1\nartist=Source Artist\ntrack=3\nTLEN=1000\n'
  exit 0
fi
if [ "$last" = "-" ]; then
  cat "$first"
  exit $?
fi
{fail}
if [ "$first" = "pipe:0" ]; then
  cat > "$last"
else
  cp "$first" "$last"
fi
cat "$second" >> "$last"
"#
    )
}
