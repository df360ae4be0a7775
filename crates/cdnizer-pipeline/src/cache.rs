//! Persisted upload cache.
//!
//! The table maps every uploaded [`AssetKey`] to the source path it was uploaded
//! from. A key being present means an earlier run believes the object exists in the
//! bucket; nothing verifies that remotely. The whole table is rewritten after every
//! mutation, through a temporary file and a rename so a crash never leaves a
//! truncated document behind.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cdnizer_core::AssetKey;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::CacheError;

pub struct CacheStore {
    path: PathBuf,
    enabled: bool,
    // Held across mutate-and-persist so writers never interleave.
    table: Mutex<HashMap<AssetKey, String>>,
}

impl CacheStore {
    /// Load the table at `path`, creating an empty document if none exists.
    ///
    /// The file is read (and created) even when caching is disabled; `enabled` only
    /// controls whether lookups hit and whether uploads are recorded.
    pub async fn load(path: impl Into<PathBuf>, enabled: bool) -> Result<Self, CacheError> {
        let path = path.into();

        let table = match fs::read_to_string(&path).await {
            Ok(contents) => parse_table(&path, &contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let table = HashMap::new();
                write_table(&path, &table).await?;
                tracing::debug!(path = %path.display(), "Created empty upload cache");
                table
            }
            Err(source) => return Err(CacheError::Read { path, source }),
        };

        tracing::debug!(
            path = %path.display(),
            entries = table.len(),
            enabled,
            "Loaded upload cache"
        );

        Ok(Self {
            path,
            enabled,
            table: Mutex::new(table),
        })
    }

    /// Whether `key` was recorded. Always `false` when caching is disabled.
    pub async fn has(&self, key: &AssetKey) -> bool {
        if !self.enabled {
            return false;
        }
        self.table.lock().await.contains_key(key)
    }

    /// Insert or overwrite `key`, then persist the full table.
    ///
    /// No-op when caching is disabled. A failed write is returned to the caller and the
    /// in-memory table is rolled back, so it never claims more than the file does.
    pub async fn record(&self, key: AssetKey, source_path: String) -> Result<(), CacheError> {
        if !self.enabled {
            return Ok(());
        }

        let mut table = self.table.lock().await;
        let previous = table.insert(key.clone(), source_path);
        if let Err(e) = write_table(&self.path, &table).await {
            match previous {
                Some(previous) => table.insert(key, previous),
                None => table.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Snapshot of all entries ordered by key.
    pub async fn entries(&self) -> Vec<(AssetKey, String)> {
        let table = self.table.lock().await;
        let mut entries: Vec<_> = table
            .iter()
            .map(|(key, source)| (key.clone(), source.clone()))
            .collect();
        entries.sort();
        entries
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn parse_table(path: &Path, contents: &str) -> Result<HashMap<AssetKey, String>, CacheError> {
    if contents.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(contents).map_err(|source| CacheError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_table(path: &Path, table: &HashMap<AssetKey, String>) -> Result<(), CacheError> {
    let write_err = |source: std::io::Error| CacheError::Write {
        path: path.to_path_buf(),
        source,
    };

    let sorted: BTreeMap<&str, &str> = table
        .iter()
        .map(|(key, source)| (key.as_str(), source.as_str()))
        .collect();
    let json = serde_json::to_string_pretty(&sorted).map_err(|e| write_err(e.into()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, json).await.map_err(write_err)?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(write_err(e));
    }

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
