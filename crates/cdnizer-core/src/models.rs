//! Upload result models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::keys::AssetKey;

/// Classification of one asset upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Cache miss, the object was written.
    Uploaded,
    /// Key already recorded in the cache table; no remote call was made.
    CachedHit,
    /// The provider returned neither an error nor a success payload.
    NotFound,
    /// The provider (or reading the source file) reported an error.
    Failed,
}

impl Outcome {
    /// Whether the URL is safe to publish in place of the original reference.
    pub fn is_usable(self) -> bool {
        matches!(self, Outcome::Uploaded | Outcome::CachedHit)
    }

    /// Console log level label for this outcome.
    pub fn level(self) -> &'static str {
        match self {
            Outcome::Uploaded => "success",
            Outcome::CachedHit => "cache",
            Outcome::NotFound => "info",
            Outcome::Failed => "error",
        }
    }

    /// HTTP-like status code, kept for tooling that consumed the numeric statuses.
    pub fn status_code(self) -> u16 {
        match self {
            Outcome::Uploaded => 200,
            Outcome::CachedHit => 304,
            Outcome::NotFound => 404,
            Outcome::Failed => 500,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.level())
    }
}

/// Uniform result of presenting one asset to the upload coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub key: AssetKey,
    /// Always populated; computed without network access.
    pub url: String,
    pub outcome: Outcome,
    /// Human-readable failure cause when `outcome` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl UploadResult {
    pub fn uploaded(key: AssetKey, url: String) -> Self {
        Self {
            key,
            url,
            outcome: Outcome::Uploaded,
            detail: None,
        }
    }

    pub fn cached(key: AssetKey, url: String) -> Self {
        Self {
            key,
            url,
            outcome: Outcome::CachedHit,
            detail: None,
        }
    }

    pub fn not_found(key: AssetKey, url: String) -> Self {
        Self {
            key,
            url,
            outcome: Outcome::NotFound,
            detail: None,
        }
    }

    pub fn failed(key: AssetKey, url: String, detail: impl Into<String>) -> Self {
        Self {
            key,
            url,
            outcome: Outcome::Failed,
            detail: Some(detail.into()),
        }
    }

    pub fn is_usable(&self) -> bool {
        self.outcome.is_usable()
    }

    /// Module source replacing the asset import, or `None` to keep the original reference.
    pub fn module_replacement(&self) -> Option<String> {
        self.is_usable()
            .then(|| format!("export default '{}';", self.url))
    }
}

/// What the fingerprint in an asset key is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintSource {
    /// Digest of the base file name. Edited files keep their key.
    #[default]
    Name,
    /// Digest of the file contents. Edited files get a new key.
    Content,
}

impl FromStr for FingerprintSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(FingerprintSource::Name),
            "content" => Ok(FingerprintSource::Content),
            _ => Err(anyhow::anyhow!("Invalid fingerprint source: {}", s)),
        }
    }
}
