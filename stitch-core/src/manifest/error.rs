use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to write manifest {path}: {source}")]
    Io { source: io::Error, path: PathBuf },
}

pub type ManifestResult<T> = Result<T, ManifestError>;
