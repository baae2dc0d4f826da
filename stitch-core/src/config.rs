use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::{AssetKind, MediaAsset};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct StitchConfig {
    pub videos: Vec<AssetEntry>,
    pub ads: Vec<AssetEntry>,
    pub segment_duration_sec: u32,
    pub cue_interval_sec: u32,
    pub min_last_segment_sec: u32,
    #[serde(default = "default_defer_remainder")]
    pub defer_remainder_sec: u32,
    #[serde(default)]
    pub master_manifest_name: Option<String>,
    #[serde(default)]
    pub layout: OutputLayout,
    #[serde(default)]
    pub on_segment_error: SegmentFailurePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetEntry {
    pub id: String,
    pub file_path: String,
}

/// How the batch is serialized: independent per-asset manifests behind a
/// multi-variant master, or a single flattened channel manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    #[default]
    Catalog,
    Stitched,
}

/// Whether a segmenting failure aborts the batch or drops the asset whole.
/// Must be an explicit choice; the default is the conservative one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentFailurePolicy {
    #[default]
    Abort,
    Skip,
}

impl StitchConfig {
    pub fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        };
        if self.videos.is_empty() {
            return Err(invalid("videos must not be empty".into()));
        }
        if self.segment_duration_sec == 0 {
            return Err(invalid("segment_duration_sec must be positive".into()));
        }
        let mut seen = HashSet::new();
        for entry in self.videos.iter().chain(self.ads.iter()) {
            if entry.id.is_empty() {
                return Err(invalid(format!(
                    "asset {} has an empty id",
                    entry.file_path
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(invalid(format!(
                    "duplicate asset id {} (segment filenames would collide)",
                    entry.id
                )));
            }
        }
        Ok(())
    }

    pub fn shows(&self) -> Vec<MediaAsset> {
        self.videos
            .iter()
            .map(|entry| MediaAsset::new(&entry.id, &entry.file_path, AssetKind::Show))
            .collect()
    }

    pub fn ads(&self) -> Vec<MediaAsset> {
        self.ads
            .iter()
            .map(|entry| MediaAsset::new(&entry.id, &entry.file_path, AssetKind::Ad))
            .collect()
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StitchConfig> {
    let path = path.as_ref();
    let config: StitchConfig = load_json(path)?;
    config.validate(path)?;
    Ok(config)
}

fn load_json<T, P>(path: P) -> Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}

fn default_defer_remainder() -> u32 {
    780
}
