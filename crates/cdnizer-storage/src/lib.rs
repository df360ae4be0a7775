//! Cdnizer Storage Library
//!
//! This crate provides the remote write side of the asset pipeline: the `Storage` trait
//! and implementations for S3-compatible buckets and the local filesystem.
//!
//! Every backend performs exactly one write attempt per call and never consults the
//! upload cache. Keys are produced by `cdnizer_core::keys` and must not contain `..`
//! or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use cdnizer_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectBody, PutResponse, Storage, StorageError, StorageResult};
