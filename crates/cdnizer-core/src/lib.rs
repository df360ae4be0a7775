//! Cdnizer Core Library
//!
//! This crate provides the configuration, error types, storage key derivation and
//! result models shared by the cdnizer storage, pipeline and CLI crates.
//!
//! # Storage key format
//!
//! Keys are `{upload_prefix}/{name}{extension}`, where `name` is either the original
//! base name of the asset or a 32 character hex fingerprint. Key derivation lives in
//! the `keys` module so the pipeline and every storage backend agree on one layout.

pub mod config;
pub mod constants;
pub mod error;
pub mod include;
pub mod keys;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{CdnizerConfig, Credentials};
pub use error::KeyError;
pub use include::{normalize_path, IncludeRule, SourceFilter};
pub use keys::{fingerprint, public_url, AssetKey, Fingerprinter, KeyDeriver};
pub use models::{FingerprintSource, Outcome, UploadResult};
pub use storage_types::StorageBackend;
