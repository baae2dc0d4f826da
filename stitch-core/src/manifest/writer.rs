use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::info;

use crate::manifest::error::{ManifestError, ManifestResult};
use crate::manifest::Playlist;

/// Single-rendition placeholder, not a measured bitrate.
pub const STREAM_INF_BANDWIDTH: u32 = 500_000;

pub fn default_master_name(now: DateTime<Utc>) -> String {
    format!("master_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Writes manifest files under a fixed output directory. Per-asset
/// playlists land at `<out>/<id>/<id>.m3u8`; master and stitched manifests
/// at `<out>/<name>.m3u8`.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    output_dir: PathBuf,
}

impl ManifestWriter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of a per-asset playlist relative to the output dir, as
    /// referenced from the master manifest.
    pub fn asset_playlist_rel(&self, asset_id: &str) -> String {
        format!("{asset_id}/{asset_id}.m3u8")
    }

    pub async fn write_asset_playlist(
        &self,
        asset_id: &str,
        playlist: &Playlist,
    ) -> ManifestResult<PathBuf> {
        let path = self.output_dir.join(asset_id).join(format!("{asset_id}.m3u8"));
        self.write(&path, playlist.render()).await?;
        Ok(path)
    }

    pub async fn write_master(
        &self,
        name: &str,
        variant_paths: &[String],
    ) -> ManifestResult<PathBuf> {
        let mut contents = String::from("#EXTM3U\n");
        for rel_path in variant_paths {
            let _ = writeln!(
                contents,
                "#EXT-X-STREAM-INF:BANDWIDTH={STREAM_INF_BANDWIDTH}"
            );
            let _ = writeln!(contents, "{rel_path}");
        }
        let path = self.output_dir.join(format!("{name}.m3u8"));
        self.write(&path, contents).await?;
        Ok(path)
    }

    pub async fn write_stitched(
        &self,
        name: &str,
        playlist: &Playlist,
    ) -> ManifestResult<PathBuf> {
        let path = self.output_dir.join(format!("{name}.m3u8"));
        self.write(&path, playlist.render()).await?;
        Ok(path)
    }

    async fn write(&self, path: &Path, contents: String) -> ManifestResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| ManifestError::Io {
                    source,
                    path: parent.to_path_buf(),
                })?;
        }
        fs::write(path, contents)
            .await
            .map_err(|source| ManifestError::Io {
                source,
                path: path.to_path_buf(),
            })?;
        info!(path = %path.display(), "manifest written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_name_is_timestamped() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 12, 34, 56).unwrap();
        assert_eq!(default_master_name(now), "master_20260830_123456");
    }

    #[tokio::test]
    async fn master_lists_one_stream_inf_per_variant() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(dir.path());
        let variants = vec![
            writer.asset_playlist_rel("show-a"),
            writer.asset_playlist_rel("ad1"),
        ];
        let path = writer.write_master("master", &variants).await.unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            contents,
            "#EXTM3U\n\
             #EXT-X-STREAM-INF:BANDWIDTH=500000\n\
             show-a/show-a.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=500000\n\
             ad1/ad1.m3u8\n"
        );
    }
}
