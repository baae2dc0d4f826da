use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::asset::{AssetKind, MediaAsset, Segment};
use crate::config::{OutputLayout, SegmentFailurePolicy, StitchConfig};
use crate::error::ConfigError;
use crate::manifest::writer::default_master_name;
use crate::manifest::{ManifestError, ManifestWriter, Playlist};
use crate::media::{
    DurationProbe, FfmpegSegmenter, FfprobeDurationProbe, MediaError, MediaTools, SegmentProducer,
};
use crate::schedule::{
    build_show_timeline, trailing_ad, AdCycler, AdPlacement, SchedulePolicy, ScheduleError,
    TimelineEntry,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("media error for asset {asset_id}: {source}")]
    Media {
        asset_id: String,
        #[source]
        source: MediaError,
    },
    #[error("scheduling failed for asset {asset_id}: {source}")]
    Schedule {
        asset_id: String,
        #[source]
        source: ScheduleError,
    },
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone)]
struct PreparedAsset {
    asset: MediaAsset,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShowReport {
    pub id: String,
    pub segments: usize,
    pub duration_sec: f64,
    pub placement: Option<AdPlacement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdReport {
    pub id: String,
    pub segments: usize,
    pub duration_sec: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedAsset {
    pub id: String,
    pub file_path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub layout: OutputLayout,
    pub shows: Vec<ShowReport>,
    pub ads: Vec<AdReport>,
    pub skipped: Vec<SkippedAsset>,
    pub trailer_ad: Option<String>,
    pub timeline_entries: usize,
    pub discontinuities: usize,
    pub manifests: Vec<PathBuf>,
}

/// Batch playout scheduler: segments and probes every asset, assembles the
/// ad-interleaved timeline in config order, and writes the manifests.
pub struct Pipeline {
    config: StitchConfig,
    writer: ManifestWriter,
    segmenter: Arc<dyn SegmentProducer>,
    probe: Arc<dyn DurationProbe>,
}

impl Pipeline {
    pub fn new(config: StitchConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self::with_tools(config, output_dir, MediaTools::default())
    }

    pub fn with_tools(
        config: StitchConfig,
        output_dir: impl Into<PathBuf>,
        tools: MediaTools,
    ) -> Self {
        let segmenter = Arc::new(FfmpegSegmenter::new(tools.clone(), None));
        let probe = Arc::new(FfprobeDurationProbe::new(tools, None));
        Self::with_collaborators(config, output_dir, segmenter, probe)
    }

    pub fn with_collaborators(
        config: StitchConfig,
        output_dir: impl Into<PathBuf>,
        segmenter: Arc<dyn SegmentProducer>,
        probe: Arc<dyn DurationProbe>,
    ) -> Self {
        Self {
            config,
            writer: ManifestWriter::new(output_dir),
            segmenter,
            probe,
        }
    }

    pub async fn run(&self) -> PipelineResult<RunReport> {
        let started_at = Utc::now();
        let policy = SchedulePolicy::from_config(&self.config);

        // Segmenting and probing are independent per asset and run
        // concurrently; join_all keeps results in input order so the later
        // sequential stage is deterministic.
        let assets: Vec<MediaAsset> = self
            .config
            .shows()
            .into_iter()
            .chain(self.config.ads())
            .collect();
        let prepared = futures::future::join_all(
            assets.iter().map(|asset| self.prepare_asset(asset)),
        )
        .await;

        let mut shows = Vec::new();
        let mut ads = Vec::new();
        let mut skipped = Vec::new();
        for (asset, result) in assets.iter().zip(prepared) {
            match result {
                Ok(ready) => match ready.asset.kind {
                    AssetKind::Show => shows.push(ready),
                    AssetKind::Ad => ads.push(ready),
                },
                Err(source @ MediaError::Segmenting { .. })
                    if self.config.on_segment_error == SegmentFailurePolicy::Skip =>
                {
                    warn!(asset_id = %asset.id, error = %source, "skipping asset after segmenting failure");
                    skipped.push(SkippedAsset {
                        id: asset.id.clone(),
                        file_path: asset.source_path.to_string_lossy().to_string(),
                        reason: source.to_string(),
                    });
                }
                Err(source) => {
                    return Err(PipelineError::Media {
                        asset_id: asset.id.clone(),
                        source,
                    });
                }
            }
        }

        // The cycler is owned here and advanced strictly in config order;
        // upstream completion order cannot reorder ad selection.
        let mut cycler = AdCycler::new(ads.iter().map(|ready| ready.asset.clone()).collect());
        let ad_segments: HashMap<String, Vec<Segment>> = ads
            .iter()
            .map(|ready| (ready.asset.id.clone(), ready.segments.clone()))
            .collect();

        let mut timeline: Vec<TimelineEntry> = Vec::new();
        let mut show_reports = Vec::new();
        for ready in &shows {
            let show_timeline = build_show_timeline(
                &ready.asset,
                &ready.segments,
                &mut cycler,
                &ad_segments,
                &policy,
            )
            .map_err(|source| PipelineError::Schedule {
                asset_id: ready.asset.id.clone(),
                source,
            })?;
            show_reports.push(ShowReport {
                id: ready.asset.id.clone(),
                segments: ready.segments.len(),
                duration_sec: ready.asset.total_duration.unwrap_or_default(),
                placement: show_timeline.placement.clone(),
            });
            timeline.extend(show_timeline.entries);
        }

        let trailer_ad = trailing_ad(&mut cycler, &ad_segments)
            .map_err(|source| {
                let asset_id = match &source {
                    ScheduleError::MissingAdSegments { asset_id } => asset_id.clone(),
                    _ => "batch".to_string(),
                };
                PipelineError::Schedule { asset_id, source }
            })?
            .map(|(ad_id, entries)| {
                timeline.extend(entries);
                ad_id
            });

        let discontinuities = timeline
            .windows(2)
            .filter(|pair| pair[0].origin_id != pair[1].origin_id)
            .count();

        let master_name = self
            .config
            .master_manifest_name
            .clone()
            .unwrap_or_else(|| default_master_name(started_at));
        let mut manifests = Vec::new();
        match self.config.layout {
            OutputLayout::Catalog => {
                let mut variants = Vec::new();
                for ready in shows.iter().chain(ads.iter()) {
                    let playlist = Playlist::from_segments(&ready.segments);
                    let path = self
                        .writer
                        .write_asset_playlist(&ready.asset.id, &playlist)
                        .await?;
                    manifests.push(path);
                    variants.push(self.writer.asset_playlist_rel(&ready.asset.id));
                }
                manifests.push(self.writer.write_master(&master_name, &variants).await?);
            }
            OutputLayout::Stitched => {
                let playlist = Playlist::from_timeline(&timeline);
                manifests.push(self.writer.write_stitched(&master_name, &playlist).await?);
            }
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            layout: self.config.layout,
            shows: show_reports,
            ads: ads
                .iter()
                .map(|ready| AdReport {
                    id: ready.asset.id.clone(),
                    segments: ready.segments.len(),
                    duration_sec: ready.asset.total_duration.unwrap_or_default(),
                })
                .collect(),
            skipped,
            trailer_ad,
            timeline_entries: timeline.len(),
            discontinuities,
            manifests,
        };
        info!(
            shows = report.shows.len(),
            ads = report.ads.len(),
            skipped = report.skipped.len(),
            entries = report.timeline_entries,
            "batch run complete"
        );
        Ok(report)
    }

    async fn prepare_asset(&self, asset: &MediaAsset) -> Result<PreparedAsset, MediaError> {
        let out_dir = self.writer.output_dir().join(&asset.id);
        let chunks = self
            .segmenter
            .segment(asset, &out_dir, self.config.segment_duration_sec)
            .await?;
        let mut segments = Vec::with_capacity(chunks.len());
        let mut total = 0.0;
        for chunk in chunks {
            let duration = self.probe.duration_sec(&chunk.path).await?;
            total += duration;
            segments.push(Segment {
                asset_id: asset.id.clone(),
                index: chunk.index,
                filename: chunk.filename,
                duration,
            });
        }
        let mut asset = asset.clone();
        asset.total_duration = Some(total);
        Ok(PreparedAsset { asset, segments })
    }
}
