//! Configuration module
//!
//! Options are loaded from the environment (after `.env.local` and `.env` are read with
//! dotenvy) or assembled in code by a build tool embedding the asset hook. Defaults
//! that depend on other options (public domain, upload prefix, cache location) are
//! resolved lazily by the getters so a partially built config stays cheap to clone.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_CACHE_FILE, DEFAULT_MULTIPART_THRESHOLD_MB, DEFAULT_SOURCE_DIR,
    FALLBACK_UPLOAD_PREFIX, MIN_MULTIPART_THRESHOLD_MB,
};
use crate::include::{IncludeRule, SourceFilter};
use crate::keys::{normalize_prefix, KeyDeriver};
use crate::models::FingerprintSource;
use crate::storage_types::StorageBackend;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Identity used to sign requests against the bucket. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    secret_id: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Cdnizer configuration
#[derive(Clone, Debug)]
pub struct CdnizerConfig {
    pub credentials: Option<Credentials>,
    pub bucket: String,
    pub region: String,
    // Custom endpoint for S3-compatible providers (Tencent COS, MinIO, etc.)
    pub endpoint: Option<String>,
    pub domain: Option<String>,
    pub upload_path_prefix: Option<String>,
    pub include: IncludeRule,
    pub source_dir: String,
    pub fingerprint_enabled: bool,
    pub fingerprint_source: FingerprintSource,
    pub caching_enabled: bool,
    pub cache_file: PathBuf,
    pub project_root: PathBuf,
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<PathBuf>,
    pub multipart_threshold_bytes: u64,
}

impl CdnizerConfig {
    /// Config targeting `bucket` in `region` with every other option at its default.
    ///
    /// The project root is the current directory; fall back to `.` when it cannot be read.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            credentials: None,
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
            domain: None,
            upload_path_prefix: None,
            include: IncludeRule::default(),
            source_dir: DEFAULT_SOURCE_DIR.to_string(),
            fingerprint_enabled: true,
            fingerprint_source: FingerprintSource::Name,
            caching_enabled: true,
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            project_root: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            storage_backend: StorageBackend::S3,
            local_storage_path: None,
            multipart_threshold_bytes: DEFAULT_MULTIPART_THRESHOLD_MB * BYTES_PER_MB,
        }
    }

    pub fn with_credentials(mut self, secret_id: &str, secret_key: &str) -> Self {
        self.credentials = Some(Credentials::new(secret_id, secret_key));
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_upload_path(mut self, prefix: impl Into<String>) -> Self {
        self.upload_path_prefix = Some(prefix.into());
        self
    }

    pub fn with_include(mut self, include: IncludeRule) -> Self {
        self.include = include;
        self
    }

    pub fn with_source_dir(mut self, source_dir: impl Into<String>) -> Self {
        self.source_dir = source_dir.into();
        self
    }

    pub fn with_fingerprint(mut self, enabled: bool) -> Self {
        self.fingerprint_enabled = enabled;
        self
    }

    pub fn with_fingerprint_source(mut self, source: FingerprintSource) -> Self {
        self.fingerprint_source = source;
        self
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    pub fn with_cache_file(mut self, cache_file: impl Into<PathBuf>) -> Self {
        self.cache_file = cache_file.into();
        self
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Publish into a local directory instead of a remote bucket.
    pub fn with_local_storage(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_backend = StorageBackend::Local;
        self.local_storage_path = Some(path.into());
        self
    }

    pub fn with_multipart_threshold(mut self, bytes: u64) -> Self {
        self.multipart_threshold_bytes = bytes;
        self
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Earlier files win: dotenvy never overrides variables that are already set.
        dotenvy::from_filename(".env.local").ok();
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build a config from an arbitrary variable source without validating it.
    ///
    /// Empty values count as unset. Malformed sizes fall back to the default;
    /// unrecognized booleans and enum values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let flag = |name: &str, default: bool| -> Result<bool, anyhow::Error> {
            match var(name) {
                Some(value) => parse_flag(&value).ok_or_else(|| {
                    anyhow::anyhow!("{} must be a boolean, got {:?}", name, value)
                }),
                None => Ok(default),
            }
        };

        let mut config = Self::new(
            var("CDNIZER_BUCKET").unwrap_or_default(),
            var("CDNIZER_REGION").unwrap_or_default(),
        );

        let secret_id = var("CDNIZER_SECRET_ID").or_else(|| var("AWS_ACCESS_KEY_ID"));
        let secret_key = var("CDNIZER_SECRET_KEY").or_else(|| var("AWS_SECRET_ACCESS_KEY"));
        config.credentials = match (secret_id, secret_key) {
            (Some(id), Some(key)) => Some(Credentials::new(id, key)),
            _ => None,
        };

        config.endpoint = var("CDNIZER_ENDPOINT");
        config.domain = var("CDNIZER_DOMAIN");
        config.upload_path_prefix = lookup("CDNIZER_UPLOAD_PATH");

        if let Some(include) = var("CDNIZER_INCLUDE") {
            config.include = IncludeRule::extensions(include.split(','));
        }
        if let Some(source_dir) = lookup("CDNIZER_SOURCE_DIR") {
            config.source_dir = source_dir.trim().to_string();
        }

        config.fingerprint_enabled = flag("CDNIZER_FINGERPRINT", true)?;
        if let Some(source) = var("CDNIZER_FINGERPRINT_SOURCE") {
            config.fingerprint_source = source.trim().parse()?;
        }
        config.caching_enabled = flag("CDNIZER_CACHE", true)?;

        if let Some(cache_file) = var("CDNIZER_CACHE_FILE") {
            config.cache_file = PathBuf::from(cache_file);
        }
        if let Some(root) = var("CDNIZER_PROJECT_ROOT") {
            config.project_root = PathBuf::from(root);
        }
        if let Some(backend) = var("CDNIZER_STORAGE_BACKEND") {
            config.storage_backend = backend.trim().parse()?;
        }
        config.local_storage_path = var("CDNIZER_LOCAL_STORAGE_PATH").map(PathBuf::from);

        config.multipart_threshold_bytes = var("CDNIZER_MULTIPART_THRESHOLD_MB")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_MULTIPART_THRESHOLD_MB)
            * BYTES_PER_MB;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.bucket.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "CDNIZER_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.region.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "CDNIZER_REGION must be set when using S3 storage backend"
                    ));
                }
                if self.credentials.is_none() {
                    return Err(anyhow::anyhow!(
                        "CDNIZER_SECRET_ID and CDNIZER_SECRET_KEY must be set when using S3 storage backend"
                    ));
                }
                if self.multipart_threshold_bytes < MIN_MULTIPART_THRESHOLD_MB * BYTES_PER_MB {
                    return Err(anyhow::anyhow!(
                        "CDNIZER_MULTIPART_THRESHOLD_MB must be at least {}",
                        MIN_MULTIPART_THRESHOLD_MB
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "CDNIZER_LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.domain.is_none() {
                    return Err(anyhow::anyhow!(
                        "CDNIZER_DOMAIN must be set when using local storage backend"
                    ));
                }
            }
        }

        if let Some(prefix) = &self.upload_path_prefix {
            normalize_prefix(prefix)
                .map_err(|e| anyhow::anyhow!("CDNIZER_UPLOAD_PATH is invalid: {}", e))?;
        }

        if self.source_dir.contains(['/', '\\']) {
            return Err(anyhow::anyhow!(
                "CDNIZER_SOURCE_DIR must be a single directory name, got {:?}",
                self.source_dir
            ));
        }

        Ok(())
    }

    /// S3 API endpoint; defaults to the Tencent COS endpoint of the region.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://cos.{}.myqcloud.com", self.region),
        }
    }

    /// Public domain assets are served from.
    ///
    /// Defaults to the bucket's COS URL, or path-style `{endpoint}/{bucket}` when a
    /// custom endpoint is configured.
    pub fn domain(&self) -> String {
        if let Some(domain) = &self.domain {
            return domain.clone();
        }
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.cos.{}.myqcloud.com/", self.bucket, self.region),
        }
    }

    /// Upload path prefix; defaults to the project directory name.
    pub fn upload_prefix(&self) -> String {
        if let Some(prefix) = &self.upload_path_prefix {
            return prefix.clone();
        }
        project_name(&self.project_root).unwrap_or_else(|| FALLBACK_UPLOAD_PREFIX.to_string())
    }

    /// Absolute (or project-relative) location of the cache table.
    pub fn cache_path(&self) -> PathBuf {
        if self.cache_file.is_absolute() {
            self.cache_file.clone()
        } else {
            self.project_root.join(&self.cache_file)
        }
    }

    pub fn source_filter(&self) -> SourceFilter {
        SourceFilter::new(&self.source_dir)
    }

    pub fn key_deriver(&self) -> Result<KeyDeriver, anyhow::Error> {
        KeyDeriver::new(&self.upload_prefix(), self.fingerprint_enabled)
            .map_err(|e| anyhow::anyhow!("Invalid upload path prefix: {}", e))
    }
}

/// Boolean environment value in any of the usual spellings.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Name of the project directory, resolving `.` and relative roots first.
fn project_name(root: &Path) -> Option<String> {
    let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    resolved
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(String::from)
}
