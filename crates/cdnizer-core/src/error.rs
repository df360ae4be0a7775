//! Error types module
//!
//! Key derivation is pure, so its only failure mode is a path that cannot name an
//! asset. Those are caller errors and never surface as an upload `Outcome`.

/// Reasons a file path cannot be turned into an [`AssetKey`](crate::AssetKey).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("Path has no file name: {0}")]
    MissingFileName(String),

    #[error("File name is not valid UTF-8: {0}")]
    NonUtf8(String),

    #[error("Invalid upload path prefix: {0}")]
    InvalidPrefix(String),

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}
