use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Show,
    Ad,
}

/// A source media file registered in the batch config. `total_duration`
/// stays `None` until every chunk has been probed.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    pub id: String,
    pub source_path: PathBuf,
    pub kind: AssetKind,
    pub total_duration: Option<f64>,
}

impl MediaAsset {
    pub fn new(id: impl Into<String>, source_path: impl Into<PathBuf>, kind: AssetKind) -> Self {
        Self {
            id: id.into(),
            source_path: source_path.into(),
            kind,
            total_duration: None,
        }
    }
}

/// One chunk of an asset. The duration is the probed playable duration,
/// never the nominal chunk length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub asset_id: String,
    pub index: usize,
    pub filename: String,
    pub duration: f64,
}
