pub mod error;
pub mod ffmpeg;
pub mod manifest;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod timing;
