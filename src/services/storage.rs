use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Largest number of keys accepted by a single remove call.
pub const MAX_REMOVE_BATCH: usize = 1000;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("signed link expired")]
    Expired,

    #[error("invalid storage request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub entries: Vec<ObjectEntry>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Object storage collaborator: put, remove, list and signed retrieval by key.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str)
    -> Result<(), StorageError>;

    /// Removes up to [`MAX_REMOVE_BATCH`] keys in one call.
    async fn remove_objects(&self, keys: &[String]) -> Result<(), StorageError>;

    /// Lists at most `limit` objects under `prefix`, resuming from `continuation`.
    async fn list_objects(
        &self,
        prefix: &str,
        limit: i32,
        continuation: Option<String>,
    ) -> Result<ObjectPage, StorageError>;

    async fn create_signed_url(&self, key: &str, ttl_secs: u64) -> Result<SignedUrl, StorageError>;

    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Retrieves the bytes behind a signed URL, failing with `Expired` once its window is over.
    async fn fetch_signed_url(&self, url: &str) -> Result<Bytes, StorageError>;

    async fn ping(&self) -> bool;
}

pub(crate) fn check_remove_batch(keys: &[String]) -> Result<(), StorageError> {
    if keys.len() > MAX_REMOVE_BATCH {
        return Err(StorageError::InvalidRequest(format!(
            "cannot remove {} keys in one call (max {})",
            keys.len(),
            MAX_REMOVE_BATCH
        )));
    }
    Ok(())
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
    http: reqwest::Client,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self {
            client,
            bucket,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 put_object failed for {}: {}", key, e))?;
        Ok(())
    }

    async fn remove_objects(&self, keys: &[String]) -> Result<(), StorageError> {
        check_remove_batch(keys)?;
        if keys.is_empty() {
            return Ok(());
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid object identifier: {}", e))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid delete request: {}", e))?;

        let res = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 delete_objects failed: {}", e))?;

        let errors = res.errors();
        if !errors.is_empty() {
            tracing::error!(
                "S3 delete_objects reported {} failed keys (first: {:?})",
                errors.len(),
                errors[0].key()
            );
            return Err(StorageError::Backend(anyhow::anyhow!(
                "{} of {} keys could not be removed",
                errors.len(),
                keys.len()
            )));
        }
        Ok(())
    }

    async fn list_objects(
        &self,
        prefix: &str,
        limit: i32,
        continuation: Option<String>,
    ) -> Result<ObjectPage, StorageError> {
        let res = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(limit)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 list_objects_v2 failed for {}: {}", prefix, e))?;

        let entries = res
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                // Skip directory markers
                if key.ends_with('/') {
                    return None;
                }
                Some(ObjectEntry {
                    key,
                    size: obj.size().unwrap_or(0),
                })
            })
            .collect();

        let next_token = if res.is_truncated().unwrap_or(false) {
            res.next_continuation_token().map(|t| t.to_string())
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            next_token,
        })
    }

    async fn create_signed_url(&self, key: &str, ttl_secs: u64) -> Result<SignedUrl, StorageError> {
        let presigning_config = PresigningConfig::builder()
            .expires_in(Duration::from_secs(ttl_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid presigning config: {}", e))?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to presign {}: {}", key, e))?;

        Ok(SignedUrl {
            url: presigned_request.uri().to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl_secs as i64),
        })
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::Backend(anyhow::anyhow!(service_error))
                }
            })?;

        let data = res
            .body
            .collect()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read body of {}: {}", key, e))?;
        Ok(data.into_bytes())
    }

    async fn fetch_signed_url(&self, url: &str) -> Result<Bytes, StorageError> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Signed URL request failed: {}", e))?;

        let status = res.status();
        if status.is_success() {
            return res
                .bytes()
                .await
                .map_err(|e| StorageError::Backend(anyhow::anyhow!(e)));
        }

        let body = res.text().await.unwrap_or_default();
        match status {
            reqwest::StatusCode::FORBIDDEN if body.contains("expired") => {
                Err(StorageError::Expired)
            }
            reqwest::StatusCode::NOT_FOUND => Err(StorageError::NotFound(url.to_string())),
            _ => Err(StorageError::Backend(anyhow::anyhow!(
                "Signed URL returned {}: {}",
                status,
                body
            ))),
        }
    }

    async fn ping(&self) -> bool {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
    }
}
