use crate::traits::{
    has_parent_segment, ObjectBody, PutResponse, Storage, StorageError, StorageResult,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use cdnizer_core::Credentials;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{ObjectStoreExt, PutPayload, PutResult, WriteMultipart};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

/// Size of each part of a multipart upload.
const PART_SIZE: usize = 8 * 1024 * 1024;

/// Parts uploaded concurrently while streaming a large file.
const MAX_CONCURRENT_PARTS: usize = 4;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    multipart_threshold: u64,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `region` - Region identifier (e.g. "us-east-1", or "ap-beijing" for Tencent COS)
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g. "https://cos.ap-beijing.myqcloud.com", "http://localhost:9000" for MinIO)
    /// * `credentials` - Explicit identity; when absent the standard AWS environment is used
    /// * `multipart_threshold` - Files above this many bytes are streamed in parts
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        credentials: Option<&Credentials>,
        multipart_threshold: u64,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(credentials) = credentials {
            builder = builder
                .with_access_key_id(credentials.secret_id())
                .with_secret_access_key(credentials.secret_key());
        }

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
            multipart_threshold,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// Single PUT for files at or below the multipart threshold.
    ///
    /// The body is buffered (at most the threshold, 8 MiB by default) because a plain
    /// PUT needs the whole payload; only larger files are streamed.
    async fn put_single(&self, location: &Path, body: ObjectBody) -> StorageResult<PutResult> {
        let expected = body.content_length();
        let mut buffer = Vec::with_capacity(expected as usize);
        body.into_reader().read_to_end(&mut buffer).await?;

        let actual = buffer.len() as u64;
        if actual != expected {
            return Err(StorageError::SizeMismatch { expected, actual });
        }

        self.store
            .put(location, PutPayload::from(Bytes::from(buffer)))
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))
    }

    /// Stream a large file in parts without holding it in memory.
    async fn put_streaming(&self, location: &Path, body: ObjectBody) -> StorageResult<PutResult> {
        let expected = body.content_length();
        let upload = self
            .store
            .put_multipart(location)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, PART_SIZE);

        let mut stream = ReaderStream::new(body.into_reader());
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(StorageError::IoError(e));
                }
            };
            if let Err(e) = writer.wait_for_capacity(MAX_CONCURRENT_PARTS).await {
                let _ = writer.abort().await;
                return Err(StorageError::UploadFailed(e.to_string()));
            }
            written += chunk.len() as u64;
            writer.write(&chunk);
        }

        if written != expected {
            let _ = writer.abort().await;
            return Err(StorageError::SizeMismatch {
                expected,
                actual: written,
            });
        }

        writer
            .finish()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))
    }
}

/// A successful call that carries neither an ETag nor a version id is not an
/// acknowledgement the object exists.
fn classify_put(e_tag: Option<String>, version: Option<String>) -> PutResponse {
    if e_tag.is_none() && version.is_none() {
        PutResponse::NoResponse
    } else {
        PutResponse::Stored { e_tag, version }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_object(&self, key: &str, body: ObjectBody) -> StorageResult<PutResponse> {
        if key.is_empty() || key.starts_with('/') || has_parent_segment(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        let location = Path::from(key);
        let size = body.content_length();
        let multipart = size > self.multipart_threshold;
        let start = std::time::Instant::now();

        let result = if multipart {
            self.put_streaming(&location, body).await
        } else {
            self.put_single(&location, body).await
        };

        let put = result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                multipart,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            e
        })?;

        let response = classify_put(put.e_tag, put.version);

        if response.is_stored() {
            tracing::info!(
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                multipart,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload successful"
            );
        } else {
            tracing::warn!(
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload returned no acknowledgement"
            );
        }

        Ok(response)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
