use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("non-positive nominal segment length {nominal}")]
    InvalidNominalLength { nominal: f64 },
    #[error("non-positive total duration {total}")]
    InvalidTotalDuration { total: f64 },
    #[error("asset {asset_id} has no segments")]
    EmptySegments { asset_id: String },
    #[error("ad {asset_id} selected for insertion has no prepared segments")]
    MissingAdSegments { asset_id: String },
    #[error(
        "segment durations for asset {asset_id} sum to {actual:.3}s, expected {expected:.3}s"
    )]
    InconsistentDurations {
        asset_id: String,
        expected: f64,
        actual: f64,
    },
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
