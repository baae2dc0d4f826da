use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use crate::asset::MediaAsset;
use crate::media::{CommandExecutor, MediaError, MediaResult, MediaTools, SystemCommandExecutor};

/// One chunk file on disk, in playback order. Durations are probed
/// separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFile {
    pub index: usize,
    pub filename: String,
    pub path: PathBuf,
}

/// Cuts a source asset into ordered, nominally fixed-length chunk files.
/// Implementations return the chunk list directly; callers never recover
/// ordering from a directory listing.
#[async_trait::async_trait]
pub trait SegmentProducer: Send + Sync {
    async fn segment(
        &self,
        asset: &MediaAsset,
        out_dir: &Path,
        nominal_sec: u32,
    ) -> MediaResult<Vec<ChunkFile>>;
}

pub struct FfmpegSegmenter {
    tools: MediaTools,
    executor: Arc<dyn CommandExecutor>,
}

impl FfmpegSegmenter {
    pub fn new(tools: MediaTools, executor: Option<Arc<dyn CommandExecutor>>) -> Self {
        Self {
            tools,
            executor: executor.unwrap_or_else(|| Arc::new(SystemCommandExecutor)),
        }
    }
}

#[async_trait::async_trait]
impl SegmentProducer for FfmpegSegmenter {
    async fn segment(
        &self,
        asset: &MediaAsset,
        out_dir: &Path,
        nominal_sec: u32,
    ) -> MediaResult<Vec<ChunkFile>> {
        fs::create_dir_all(out_dir)
            .await
            .map_err(|source| MediaError::Io {
                source,
                path: out_dir.to_path_buf(),
            })?;
        let pattern = out_dir.join("seg%03d.ts");

        let mut command = Command::new(&self.tools.ffmpeg);
        command
            .arg("-y")
            .arg("-i")
            .arg(&asset.source_path)
            .arg("-c")
            .arg("copy")
            .arg("-map")
            .arg("0")
            .arg("-f")
            .arg("segment")
            .arg("-segment_time")
            .arg(nominal_sec.to_string())
            .arg("-reset_timestamps")
            .arg("1")
            .arg(&pattern);

        debug!(asset_id = %asset.id, input = %asset.source_path.display(), "running ffmpeg segmenter");
        let output = self
            .executor
            .run(&mut command)
            .await
            .map_err(|source| MediaError::Io {
                source,
                path: asset.source_path.clone(),
            })?;
        if !output.status.success() {
            return Err(MediaError::Segmenting {
                path: asset.source_path.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let chunks = collect_chunks(out_dir).await?;
        if chunks.is_empty() {
            return Err(MediaError::Segmenting {
                path: asset.source_path.clone(),
                status: output.status.code(),
                stderr: "ffmpeg produced no chunk files".to_string(),
            });
        }
        info!(asset_id = %asset.id, chunks = chunks.len(), "asset segmented");
        Ok(chunks)
    }
}

/// Walk the numbered output pattern upward until the next index is missing.
/// Ordering comes from the indices ffmpeg assigned, not from a lexical sort.
async fn collect_chunks(out_dir: &Path) -> MediaResult<Vec<ChunkFile>> {
    let mut chunks = Vec::new();
    loop {
        let index = chunks.len();
        let filename = format!("seg{index:03}.ts");
        let path = out_dir.join(&filename);
        let exists = fs::try_exists(&path)
            .await
            .map_err(|source| MediaError::Io {
                source,
                path: path.clone(),
            })?;
        if !exists {
            break;
        }
        chunks.push(ChunkFile {
            index,
            filename,
            path,
        });
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunks_are_collected_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        for index in 0..3 {
            std::fs::write(dir.path().join(format!("seg{index:03}.ts")), b"x").unwrap();
        }
        // A stray later index with a gap before it is not part of the run.
        std::fs::write(dir.path().join("seg005.ts"), b"x").unwrap();

        let chunks = collect_chunks(dir.path()).await.unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].filename, "seg000.ts");
        assert_eq!(chunks[2].filename, "seg002.ts");
    }

    #[tokio::test]
    async fn empty_dir_yields_no_chunks() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_chunks(dir.path()).await.unwrap().is_empty());
    }
}
