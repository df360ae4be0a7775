//! Defaults shared by configuration, the build hook and the CLI.

/// Extensions intercepted when no include rule is configured.
pub const DEFAULT_INCLUDE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".svg", ".gif"];

/// Directory segment an asset path must contain to be intercepted.
pub const DEFAULT_SOURCE_DIR: &str = "src";

/// Cache table location, relative to the project root.
pub const DEFAULT_CACHE_FILE: &str = ".cache.json";

/// Files larger than this are streamed through a multipart upload.
pub const DEFAULT_MULTIPART_THRESHOLD_MB: u64 = 8;

/// S3 rejects multipart parts smaller than 5 MiB (except the last one).
pub const MIN_MULTIPART_THRESHOLD_MB: u64 = 5;

/// Number of digest bytes kept in a fingerprint; rendered as 32 hex characters.
pub const FINGERPRINT_BYTES: usize = 16;

/// Prefix used when the project directory has no usable name (e.g. `/`).
pub const FALLBACK_UPLOAD_PREFIX: &str = "assets";
