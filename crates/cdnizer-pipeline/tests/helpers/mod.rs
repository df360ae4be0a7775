#![allow(dead_code)]

use async_trait::async_trait;
use cdnizer_core::{KeyDeriver, UploadResult};
use cdnizer_pipeline::{CacheStore, ReportSink, UploadCoordinator};
use cdnizer_storage::{ObjectBody, PutResponse, Storage, StorageBackend, StorageError, StorageResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

pub const DOMAIN: &str = "https://cdn.example.com/";
pub const PREFIX: &str = "shop";

/// How the mock answers `put_object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    Succeed,
    Fail,
    NoResponse,
}

/// In-memory storage counting every write attempt.
pub struct MockStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    calls: AtomicUsize,
    mode: Mutex<MockMode>,
    delay: Option<Duration>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            mode: Mutex::new(MockMode::Succeed),
            delay: None,
        }
    }

    pub fn with_mode(mode: MockMode) -> Self {
        let storage = Self::new();
        storage.set_mode(mode);
        storage
    }

    /// Hold every write for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_mode(&self, mode: MockMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn get_file(&self, key: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(key).cloned()
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put_object(&self, key: &str, body: ObjectBody) -> StorageResult<PutResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mode = *self.mode.lock().unwrap();
        match mode {
            MockMode::Fail => Err(StorageError::UploadFailed(
                "AccessDenied: signature mismatch".to_string(),
            )),
            MockMode::NoResponse => Ok(PutResponse::NoResponse),
            MockMode::Succeed => {
                let mut data = Vec::new();
                body.into_reader().read_to_end(&mut data).await?;
                self.files.lock().unwrap().insert(key.to_string(), data);
                Ok(PutResponse::Stored {
                    e_tag: Some("\"mock-etag\"".to_string()),
                    version: None,
                })
            }
        }
    }

    fn bucket(&self) -> &str {
        "mock-bucket"
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Report sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingReport {
    pub banners: AtomicUsize,
    pub lines: Mutex<Vec<(String, UploadResult)>>,
}

impl RecordingReport {
    pub fn banners(&self) -> usize {
        self.banners.load(Ordering::SeqCst)
    }

    pub fn lines(&self) -> Vec<(String, UploadResult)> {
        self.lines.lock().unwrap().clone()
    }
}

impl ReportSink for RecordingReport {
    fn banner(&self) {
        self.banners.fetch_add(1, Ordering::SeqCst);
    }

    fn asset(&self, source: &str, result: &UploadResult) {
        self.lines
            .lock()
            .unwrap()
            .push((source.to_string(), result.clone()));
    }
}

/// A throwaway project directory with a `src/` folder.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root().join(".cache.json")
    }

    /// Write `contents` at `relative` (e.g. "src/logo.png") and return the absolute path.
    pub fn asset(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub async fn cache(&self, enabled: bool) -> CacheStore {
        CacheStore::load(self.cache_path(), enabled).await.unwrap()
    }

    pub async fn coordinator(
        &self,
        storage: Arc<MockStorage>,
        fingerprint: bool,
        caching: bool,
    ) -> UploadCoordinator {
        UploadCoordinator::new(
            KeyDeriver::new(PREFIX, fingerprint).unwrap(),
            DOMAIN,
            self.cache(caching).await,
            storage,
        )
    }
}
