use crate::error::{MergeError, Result};
use crate::ffmpeg::command::STDIN;
use crate::ffmpeg::process::Invocation;
use crate::ffmpeg::{Toolchain, pcm_args};
use crate::manifest::Chapter;
use crate::progress::Progress;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::process::{Child, ChildStdin};
use tracing::{debug, warn};

/// Why feeding the encoder stopped early.
enum FeedStop {
    EncoderExited,
    Failed(MergeError),
}

/// Decode every file and stream the PCM through one long-lived encoder.
///
/// A failure part way through leaves whatever the encoder already wrote at `output`.
pub fn encode(
    tools: &Toolchain,
    chapters: &[Chapter],
    metadata_file: &Path,
    album_art: Option<&Path>,
    output: &Path,
    format: &str,
    progress: &mut dyn Progress,
) -> Result<()> {
    let mut cmd = tools.ffmpeg_command();
    cmd.set_format(format);
    cmd.add_input_with(STDIN, &pcm_args());
    cmd.add_map(0, 0);
    cmd.add_metadata_input(metadata_file);
    if let Some(art) = album_art {
        cmd.add_album_art(art, 0);
    }
    cmd.set_output(output, true);

    let invocation = Invocation::new(&cmd).pipe_stdin(true).capture_stdout(false);
    // Unlinked scratch file; removed by the OS once closed.
    let mut log = tempfile::tempfile()?;
    let mut encoder = invocation.spawn_logging(&log)?;
    let mut stdin = encoder
        .stdin
        .take()
        .ok_or_else(|| MergeError::Config("encoder stdin was not captured".to_string()))?;

    let files: Vec<&Path> = chapters
        .iter()
        .flat_map(|c| c.files.iter().map(|f| f.path.as_path()))
        .collect();

    progress.begin(files.len());
    let fed = feed(tools, &files, &mut stdin, &mut encoder, progress);
    // End of stream.
    drop(stdin);

    match fed {
        Ok(()) => {}
        Err(FeedStop::Failed(err)) => {
            warn!(error = %err, "stopping encoder");
            let _ = encoder.kill();
            let _ = encoder.wait();
            return Err(err);
        }
        Err(FeedStop::EncoderExited) => {
            encoder.wait()?;
            let mut err = invocation.failure(&read_log(&mut log)?);
            if let MergeError::Subprocess { stderr, .. } = &mut err {
                stderr.insert_str(0, "ffmpeg aborted unexpectedly: ");
            }
            return Err(err);
        }
    }

    if !encoder.wait()?.success() {
        return Err(invocation.failure(&read_log(&mut log)?));
    }
    progress.finish();
    debug!(output = %output.display(), "encoder finished");
    Ok(())
}

fn feed(
    tools: &Toolchain,
    files: &[&Path],
    stdin: &mut ChildStdin,
    encoder: &mut Child,
    progress: &mut dyn Progress,
) -> std::result::Result<(), FeedStop> {
    for file in files {
        progress.step(&format!("Writing {}", file.display()));
        let pcm = tools.decode_pcm(file).map_err(FeedStop::Failed)?;

        // Poll before writing so an exited encoder is reported, not blocked on.
        match encoder.try_wait() {
            Ok(Some(_)) => return Err(FeedStop::EncoderExited),
            Ok(None) => {}
            Err(e) => return Err(FeedStop::Failed(e.into())),
        }

        if let Err(e) = stdin.write_all(&pcm) {
            return Err(match e.kind() {
                std::io::ErrorKind::BrokenPipe => FeedStop::EncoderExited,
                _ => FeedStop::Failed(e.into()),
            });
        }
    }
    stdin.flush().map_err(|e| FeedStop::Failed(e.into()))
}

fn read_log(log: &mut File) -> Result<Vec<u8>> {
    let mut text = Vec::new();
    log.seek(SeekFrom::Start(0))?;
    log.read_to_end(&mut text)?;
    Ok(text)
}
