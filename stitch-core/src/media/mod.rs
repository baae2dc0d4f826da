pub mod probe;
pub mod segmenter;

pub use probe::{DurationProbe, FfprobeDurationProbe};
pub use segmenter::{ChunkFile, FfmpegSegmenter, SegmentProducer};

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("segmenting failed for {path}: {stderr}")]
    Segmenting {
        path: PathBuf,
        status: Option<i32>,
        stderr: String,
    },
    #[error("duration probe failed for {path}: {stderr}")]
    Probe {
        path: PathBuf,
        status: Option<i32>,
        stderr: String,
    },
    #[error("unparseable probe output for {path}: {raw:?}")]
    InvalidProbeOutput { path: PathBuf, raw: String },
    #[error("io error at {path}: {source}")]
    Io { source: io::Error, path: PathBuf },
}

pub type MediaResult<T> = Result<T, MediaError>;

#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, command: &mut Command) -> io::Result<std::process::Output>;
}

#[derive(Debug, Default)]
pub struct SystemCommandExecutor;

#[async_trait::async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn run(&self, command: &mut Command) -> io::Result<std::process::Output> {
        command.output().await
    }
}

/// Locations of the external media binaries.
#[derive(Debug, Clone)]
pub struct MediaTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for MediaTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}
