//! Storage key derivation.
//!
//! Key format: `{prefix}/{name}{extension}` where `name` is the base name of the asset
//! (file name without its final extension) or its fingerprint. Everything here is pure:
//! the same path and the same deriver always produce the same key.
//!
//! Fingerprints are truncated SHA-256 digests. They keep keys short and stable; they
//! are identifiers, not a security property.

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::FINGERPRINT_BYTES;
use crate::error::KeyError;

/// Deterministic storage identifier of an asset inside the bucket.
///
/// Never starts or ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the key, i.e. the uploaded file name.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AssetKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Fingerprint of arbitrary bytes: the first 16 bytes of their SHA-256, lowercase hex.
pub fn fingerprint(input: &[u8]) -> String {
    let mut hasher = Fingerprinter::new();
    hasher.update(input);
    hasher.finish()
}

/// Incremental [`fingerprint`] for content that is read in chunks.
#[derive(Clone, Default)]
pub struct Fingerprinter(Sha256);

impl Fingerprinter {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.0.update(chunk);
    }

    pub fn finish(self) -> String {
        let digest = self.0.finalize();
        hex::encode(&digest[..FINGERPRINT_BYTES])
    }
}

/// Split a file name into base name and extension the way build tools do:
/// the extension starts at the last `.` that is not the first character.
fn split_file_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

fn file_name_of(path: &Path) -> Result<&str, KeyError> {
    let name = path
        .file_name()
        .ok_or_else(|| KeyError::MissingFileName(path.display().to_string()))?;
    let name = name
        .to_str()
        .ok_or_else(|| KeyError::NonUtf8(path.display().to_string()))?;
    if name.is_empty() {
        return Err(KeyError::MissingFileName(path.display().to_string()));
    }
    Ok(name)
}

/// Normalize an upload prefix into `a/b/c` form.
///
/// Both separators are accepted, empty and `.` segments are dropped, `..` is rejected.
pub fn normalize_prefix(prefix: &str) -> Result<String, KeyError> {
    let mut segments = Vec::new();
    for segment in prefix.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return Err(KeyError::InvalidPrefix(prefix.to_string())),
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

/// Derives [`AssetKey`]s for one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDeriver {
    prefix: String,
    fingerprint: bool,
}

impl KeyDeriver {
    /// Create a deriver for `prefix` (may be empty) with name fingerprinting on or off.
    pub fn new(prefix: &str, fingerprint: bool) -> Result<Self, KeyError> {
        Ok(Self {
            prefix: normalize_prefix(prefix)?,
            fingerprint,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn fingerprint_enabled(&self) -> bool {
        self.fingerprint
    }

    /// Key for `path` based on its file name.
    pub fn derive(&self, path: &Path) -> Result<AssetKey, KeyError> {
        let (base, extension) = split_file_name(file_name_of(path)?);
        let name = if self.fingerprint {
            fingerprint(base.as_bytes())
        } else {
            base.to_string()
        };
        Ok(self.join(&name, extension))
    }

    /// Key for `path` using a precomputed content fingerprint in place of the base name.
    ///
    /// The extension still comes from the path. Used when keys must change whenever the
    /// file contents change.
    pub fn derive_with_digest(&self, path: &Path, digest: &str) -> Result<AssetKey, KeyError> {
        let valid = digest.len() == FINGERPRINT_BYTES * 2
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(KeyError::InvalidFingerprint(digest.to_string()));
        }
        let (_, extension) = split_file_name(file_name_of(path)?);
        Ok(self.join(digest, extension))
    }

    fn join(&self, name: &str, extension: &str) -> AssetKey {
        if self.prefix.is_empty() {
            AssetKey(format!("{name}{extension}"))
        } else {
            AssetKey(format!("{}/{name}{extension}", self.prefix))
        }
    }
}

/// Public URL of `key` under `domain`.
///
/// One trailing slash is trimmed from the domain and one leading slash from the key,
/// then both are joined with exactly one `/`. The scheme is left untouched.
pub fn public_url(domain: &str, key: &str) -> String {
    let domain = domain.strip_suffix('/').unwrap_or(domain);
    let key = key.strip_prefix('/').unwrap_or(key);
    format!("{domain}/{key}")
}
