//! Cdnizer Pipeline Library
//!
//! Turns a local asset path into a public URL: derive the storage key, consult the
//! persisted upload cache, upload on a miss, and report the outcome.
//!
//! - [`CacheStore`] is the advisory `key -> source path` table persisted as JSON.
//! - [`UploadCoordinator`] owns the cache and the storage backend and collapses
//!   concurrent requests for the same key onto one upload.
//! - [`AssetHook`] is the build-tool facing adapter that filters paths, prints the
//!   console report and produces the replacement module source.

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod fingerprint;
pub mod hook;
pub mod report;

pub use cache::CacheStore;
pub use coordinator::UploadCoordinator;
pub use error::{CacheError, PipelineError};
pub use fingerprint::content_fingerprint;
pub use hook::AssetHook;
pub use report::{format_line, ConsoleReport, ReportSink, BANNER};
