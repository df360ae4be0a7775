//! Upload coordinator.
//!
//! For each asset path: derive the key, return `CachedHit` when the cache already has
//! it, otherwise perform exactly one `put_object` and record the key on success.
//! Concurrent requests for the same key share one in-flight upload and all receive
//! its result.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use cdnizer_core::{
    normalize_path, public_url, AssetKey, CdnizerConfig, FingerprintSource, KeyDeriver,
    UploadResult,
};
use cdnizer_storage::{create_storage, ObjectBody, PutResponse, Storage};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::cache::CacheStore;
use crate::error::PipelineError;
use crate::fingerprint::content_fingerprint;

type InFlightUpload = Shared<BoxFuture<'static, Result<UploadResult, PipelineError>>>;

struct State {
    cache: CacheStore,
    storage: Arc<dyn Storage>,
    // Lock order: `in_flight` before the cache table.
    in_flight: Mutex<HashMap<AssetKey, InFlightUpload>>,
}

/// Cheap to clone; clones share the cache, the storage backend and the in-flight table.
#[derive(Clone)]
pub struct UploadCoordinator {
    deriver: KeyDeriver,
    fingerprint_source: FingerprintSource,
    domain: String,
    state: Arc<State>,
}

impl UploadCoordinator {
    pub fn new(
        deriver: KeyDeriver,
        domain: impl Into<String>,
        cache: CacheStore,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            deriver,
            fingerprint_source: FingerprintSource::default(),
            domain: domain.into(),
            state: Arc::new(State {
                cache,
                storage,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn with_fingerprint_source(mut self, source: FingerprintSource) -> Self {
        self.fingerprint_source = source;
        self
    }

    /// Build the coordinator described by `config`: load the cache and connect storage.
    pub async fn from_config(config: &CdnizerConfig) -> anyhow::Result<Self> {
        let deriver = config.key_deriver()?;

        let cache_path = config.cache_path();
        let cache = CacheStore::load(&cache_path, config.caching_enabled)
            .await
            .with_context(|| format!("Failed to load upload cache {}", cache_path.display()))?;

        let storage = create_storage(config)
            .await
            .context("Failed to initialize storage backend")?;

        tracing::info!(
            backend = %storage.backend_type(),
            bucket = %storage.bucket(),
            prefix = %deriver.prefix(),
            fingerprint = deriver.fingerprint_enabled(),
            caching = config.caching_enabled,
            "Upload coordinator ready"
        );

        Ok(Self::new(deriver, config.domain(), cache, storage)
            .with_fingerprint_source(config.fingerprint_source))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.state.cache
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Storage key for `path` from its file name, without touching the filesystem.
    pub fn key_for(&self, path: &Path) -> Result<AssetKey, PipelineError> {
        Ok(self.deriver.derive(path)?)
    }

    pub fn url_for(&self, key: &AssetKey) -> String {
        public_url(&self.domain, key.as_str())
    }

    /// Upload `path` unless its key is cached, and classify the outcome.
    ///
    /// Transport problems come back as `Ok` with a `Failed` or `NotFound` outcome; only
    /// an invalid path or a cache persistence failure is an `Err`.
    pub async fn upload(&self, path: &Path) -> Result<UploadResult, PipelineError> {
        let key = match self.resolve_key(path).await? {
            Ok(key) => key,
            Err(failed) => return Ok(failed),
        };
        let url = self.url_for(&key);

        if self.state.cache.has(&key).await {
            tracing::debug!(key = %key, "Upload cache hit");
            return Ok(UploadResult::cached(key, url));
        }

        let upload = {
            let mut in_flight = self.state.in_flight.lock().await;
            if let Some(existing) = in_flight.get(&key) {
                tracing::debug!(key = %key, "Joining in-flight upload");
                existing.clone()
            } else {
                // The previous upload of this key may have finished since the check above.
                if self.state.cache.has(&key).await {
                    return Ok(UploadResult::cached(key, url));
                }
                let upload = Self::spawn_upload(
                    Arc::clone(&self.state),
                    key.clone(),
                    url,
                    path.to_path_buf(),
                );
                in_flight.insert(key, upload.clone());
                upload
            }
        };

        upload.await
    }

    /// Key for `path` under the configured fingerprint source.
    ///
    /// The inner `Err` is a ready `Failed` result for content that cannot be read.
    async fn resolve_key(
        &self,
        path: &Path,
    ) -> Result<Result<AssetKey, UploadResult>, PipelineError> {
        let name_key = self.deriver.derive(path)?;
        if self.fingerprint_source == FingerprintSource::Name || !self.deriver.fingerprint_enabled()
        {
            return Ok(Ok(name_key));
        }

        match content_fingerprint(path).await {
            Ok(digest) => Ok(Ok(self.deriver.derive_with_digest(path, &digest)?)),
            Err(e) => {
                let url = self.url_for(&name_key);
                Ok(Err(UploadResult::failed(
                    name_key,
                    url,
                    format!("Failed to read {}: {}", path.display(), e),
                )))
            }
        }
    }

    fn spawn_upload(
        state: Arc<State>,
        key: AssetKey,
        url: String,
        path: PathBuf,
    ) -> InFlightUpload {
        async move {
            let result = state.put_and_record(&key, url, &path).await;
            state.in_flight.lock().await.remove(&key);
            result
        }
        .boxed()
        .shared()
    }
}

impl State {
    async fn put_and_record(
        &self,
        key: &AssetKey,
        url: String,
        path: &Path,
    ) -> Result<UploadResult, PipelineError> {
        let body = match ObjectBody::open(path).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(key = %key, path = %path.display(), error = %e, "Asset unreadable");
                return Ok(UploadResult::failed(
                    key.clone(),
                    url,
                    format!("Failed to read {}: {}", path.display(), e),
                ));
            }
        };

        match self.storage.put_object(key.as_str(), body).await {
            Ok(PutResponse::Stored { .. }) => {
                self.cache.record(key.clone(), normalize_path(path)).await?;
                Ok(UploadResult::uploaded(key.clone(), url))
            }
            Ok(PutResponse::NoResponse) => Ok(UploadResult::not_found(key.clone(), url)),
            Err(e) => Ok(UploadResult::failed(key.clone(), url, e.to_string())),
        }
    }
}
