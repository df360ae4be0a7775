//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Size mismatch: expected {expected} bytes, read {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Whether `key` has a `..` path segment. Names like `logo..png` are fine.
pub(crate) fn has_parent_segment(key: &str) -> bool {
    key.split(['/', '\\']).any(|segment| segment == "..")
}

/// Byte stream of one object together with its exact length.
///
/// The length is fixed when the body is created. Backends must send exactly that many
/// bytes and report [`StorageError::SizeMismatch`] if the stream ends early.
pub struct ObjectBody {
    reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    content_length: u64,
}

impl ObjectBody {
    pub fn new(reader: Pin<Box<dyn AsyncRead + Send + Unpin>>, content_length: u64) -> Self {
        Self {
            reader,
            content_length,
        }
    }

    /// Open `path` and take its size from the same handle the bytes are read from.
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let content_length = file.metadata().await?.len();
        Ok(Self::new(Box::pin(file), content_length))
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes: Bytes = bytes.into();
        let content_length = bytes.len() as u64;
        Self::new(Box::pin(std::io::Cursor::new(bytes)), content_length)
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Reader limited to the stated length.
    pub fn into_reader(self) -> tokio::io::Take<Pin<Box<dyn AsyncRead + Send + Unpin>>> {
        tokio::io::AsyncReadExt::take(self.reader, self.content_length)
    }
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// What the provider answered to a successful write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutResponse {
    /// The provider acknowledged the object.
    Stored {
        e_tag: Option<String>,
        version: Option<String>,
    },
    /// The call returned without an error but also without any acknowledgement.
    ///
    /// Usually a protocol or provider-version mismatch; callers must not assume the
    /// object exists.
    NoResponse,
}

impl PutResponse {
    pub fn is_stored(&self) -> bool {
        matches!(self, PutResponse::Stored { .. })
    }
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait. The
/// coordinator only ever issues one `put_object` per cache miss; implementations
/// must not retry internally.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `body` at `key` in the configured bucket.
    ///
    /// Provider errors are returned as `Err`; an acknowledgement-free answer is
    /// `Ok(PutResponse::NoResponse)`.
    async fn put_object(&self, key: &str, body: ObjectBody) -> StorageResult<PutResponse>;

    /// Bucket (or directory) objects are written to.
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
