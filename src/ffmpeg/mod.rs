pub mod command;
pub mod process;

use crate::error::{MergeError, Result};
use crate::metadata::{Layer, ffmetadata};
use command::{CommandLine, STDOUT};
use process::Invocation;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Raw PCM layout exchanged between the decoder and the encoder.
pub const PCM_FORMAT: &str = "s16le";
pub const PCM_CHANNELS: &str = "2";
pub const PCM_SAMPLE_RATE: &str = "44100";

pub const DEFAULT_OUTPUT_FORMAT: &str = "mp4";

/// Locations of the external media tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// Flags describing the raw PCM stream, valid both as input and output options.
pub fn pcm_args() -> [&'static str; 6] {
    ["-f", PCM_FORMAT, "-ac", PCM_CHANNELS, "-ar", PCM_SAMPLE_RATE]
}

impl Toolchain {
    pub fn ffmpeg_command(&self) -> CommandLine {
        CommandLine::new(&self.ffmpeg)
    }

    /// Duration of one file in seconds, as reported by ffprobe.
    pub fn probe_duration(&self, path: &Path) -> Result<f64> {
        let mut cmd = CommandLine::new(&self.ffprobe);
        cmd.add_input(path);
        cmd.add_args(["-show_entries", "format=duration", "-of", "csv=p=0"]);

        let captured = Invocation::new(&cmd).run()?;
        if !captured.status.success() {
            return Err(MergeError::Probe {
                file: path.to_path_buf(),
                message: captured.stderr_text(),
            });
        }
        parse_duration(&String::from_utf8_lossy(&captured.stdout)).ok_or_else(|| {
            MergeError::Probe {
                file: path.to_path_buf(),
                message: format!(
                    "unexpected duration {:?}",
                    String::from_utf8_lossy(&captured.stdout).trim()
                ),
            }
        })
    }

    /// Read the global tags of a file.
    pub fn read_tags(&self, path: &Path) -> Result<Layer> {
        let mut cmd = self.ffmpeg_command();
        cmd.add_input(path);
        cmd.set_format("ffmetadata");
        cmd.set_output(STDOUT, true);

        let captured = Invocation::new(&cmd).run_checked()?;
        let layer = ffmetadata::parse(&String::from_utf8_lossy(&captured.stdout), path)?;
        debug!(file = %path.display(), tags = layer.len(), "read source tags");
        Ok(layer)
    }

    /// Decode one file to raw PCM, fully buffered.
    pub fn decode_pcm(&self, path: &Path) -> Result<Vec<u8>> {
        let mut cmd = self.ffmpeg_command();
        cmd.add_input(path);
        cmd.set_format(PCM_FORMAT);
        cmd.add_args(["-ac", PCM_CHANNELS, "-ar", PCM_SAMPLE_RATE]);
        cmd.set_output(STDOUT, true);

        let captured = Invocation::new(&cmd).run_checked()?;
        debug!(file = %path.display(), bytes = captured.stdout.len(), "decoded");
        Ok(captured.stdout)
    }
}

/// A non-negative, finite number of seconds.
fn parse_duration(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}
