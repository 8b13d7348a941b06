use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("{}({line}): {message}", .file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to probe {}: {message}", .file.display())]
    Probe { file: PathBuf, message: String },

    #[error("ffmpeg error:\nCommand line: {command}\n{stderr}")]
    Subprocess { command: String, stderr: String },

    #[error("{0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read {}: {source}", .file.display())]
    Read {
        file: PathBuf,
        source: std::io::Error,
    },
}

impl MergeError {
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        MergeError::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn read(file: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MergeError::Read {
            file: file.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
