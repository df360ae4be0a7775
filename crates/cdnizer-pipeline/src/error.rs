use std::path::PathBuf;
use std::sync::Arc;

use cdnizer_core::KeyError;
use thiserror::Error;

/// Errors reading or persisting the upload cache table.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to read cache file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse cache file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write cache file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors that abort a coordinator call.
///
/// Transport failures are not errors here; they are reported through
/// [`cdnizer_core::Outcome::Failed`]. Cloneable so every requester waiting on a
/// shared upload receives the same value.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("Invalid asset path: {0}")]
    InvalidAsset(#[from] KeyError),

    #[error("Cache persistence failed: {0}")]
    Persistence(Arc<CacheError>),
}

impl From<CacheError> for PipelineError {
    fn from(err: CacheError) -> Self {
        PipelineError::Persistence(Arc::new(err))
    }
}
