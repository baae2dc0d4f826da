pub mod asset;
pub mod config;
pub mod error;
pub mod manifest;
pub mod media;
pub mod pipeline;
pub mod schedule;

pub use asset::{AssetKind, MediaAsset, Segment};
pub use config::{
    load_config, AssetEntry, OutputLayout, SegmentFailurePolicy, StitchConfig,
};
pub use error::{ConfigError, Result};
pub use manifest::{
    default_master_name, ManifestError, ManifestWriter, Playlist, PlaylistEntry,
};
pub use media::{
    ChunkFile, CommandExecutor, DurationProbe, FfmpegSegmenter, FfprobeDurationProbe, MediaError,
    MediaTools, SegmentProducer, SystemCommandExecutor,
};
pub use pipeline::{Pipeline, PipelineError, RunReport};
pub use schedule::{
    AdCycler, AdPlacement, BreakDecision, OriginKind, SchedulePolicy, ScheduleError, ShowTimeline,
    TimelineEntry,
};
