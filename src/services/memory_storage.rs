use crate::services::storage::{
    ObjectEntry, ObjectPage, SignedUrl, StorageError, StorageService, check_remove_batch,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

const SIGNED_SCHEME: &str = "memory://signed/";

struct StoredObject {
    data: Bytes,
}

type ObjectMap = BTreeMap<String, StoredObject>;

/// In-process object store behind the `memory` storage backend.
///
/// Signed URLs carry their expiry as a unix timestamp and are checked against
/// an adjustable clock, so expiry can be exercised without waiting.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: RwLock<ObjectMap>,
    clock_offset_secs: AtomicI64,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock used for signed URL expiry forward.
    pub fn advance_clock(&self, by: Duration) {
        self.clock_offset_secs
            .fetch_add(by.num_seconds(), Ordering::SeqCst);
    }

    pub fn object_count(&self) -> usize {
        self.read_objects().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read_objects().contains_key(key)
    }

    // A panic mid-write cannot leave a map entry half-built, so poisoning is ignored
    fn read_objects(&self) -> RwLockReadGuard<'_, ObjectMap> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_objects(&self) -> RwLockWriteGuard<'_, ObjectMap> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.clock_offset_secs.load(Ordering::SeqCst))
    }

    fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        self.read_objects()
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl StorageService for InMemoryStorage {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        tracing::debug!("Storing {} ({}, {} bytes)", key, content_type, data.len());
        self.write_objects()
            .insert(key.to_string(), StoredObject { data });
        Ok(())
    }

    async fn remove_objects(&self, keys: &[String]) -> Result<(), StorageError> {
        check_remove_batch(keys)?;
        let mut objects = self.write_objects();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    async fn list_objects(
        &self,
        prefix: &str,
        limit: i32,
        continuation: Option<String>,
    ) -> Result<ObjectPage, StorageError> {
        let limit = limit.max(1) as usize;
        let objects = self.read_objects();

        // Keys are ordered, so the continuation token is simply the last key returned.
        let mut matching = objects
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| continuation.as_deref().is_none_or(|after| k.as_str() > after))
            .map(|(k, o)| ObjectEntry {
                key: k.clone(),
                size: o.data.len() as i64,
            });

        let entries: Vec<ObjectEntry> = matching.by_ref().take(limit).collect();
        let next_token = if matching.next().is_some() {
            entries.last().map(|e| e.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            next_token,
        })
    }

    async fn create_signed_url(&self, key: &str, ttl_secs: u64) -> Result<SignedUrl, StorageError> {
        if !self.contains(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let expires_at = self.now() + Duration::seconds(ttl_secs as i64);
        let mut url = url::Url::parse(SIGNED_SCHEME)
            .map_err(|e| anyhow::anyhow!("Invalid signed URL base: {}", e))?;
        url.query_pairs_mut()
            .append_pair("key", key)
            .append_pair("expires", &expires_at.timestamp().to_string());

        Ok(SignedUrl {
            url: url.to_string(),
            expires_at,
        })
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
        self.read(key)
    }

    async fn fetch_signed_url(&self, url: &str) -> Result<Bytes, StorageError> {
        let parsed = url::Url::parse(url)
            .map_err(|_| StorageError::InvalidRequest(format!("not a signed URL: {}", url)))?;

        let mut key = None;
        let mut expires = None;
        for (name, value) in parsed.query_pairs() {
            match name.as_ref() {
                "key" => key = Some(value.into_owned()),
                "expires" => expires = value.parse::<i64>().ok(),
                _ => {}
            }
        }

        let (Some(key), Some(expires)) = (key, expires) else {
            return Err(StorageError::InvalidRequest(
                "signed URL is missing its key or expiry".to_string(),
            ));
        };

        if self.now().timestamp() >= expires {
            return Err(StorageError::Expired);
        }
        self.read(&key)
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_pages_until_exhausted() {
        let storage = InMemoryStorage::new();
        for i in 0..5 {
            storage
                .put_object(&format!("folders/a/{}.txt", i), Bytes::from("x"), "text/plain")
                .await
                .unwrap();
        }
        storage
            .put_object("folders/b/other.txt", Bytes::from("y"), "text/plain")
            .await
            .unwrap();

        let first = storage.list_objects("folders/a/", 2, None).await.unwrap();
        assert_eq!(first.entries.len(), 2);
        let second = storage
            .list_objects("folders/a/", 2, first.next_token.clone())
            .await
            .unwrap();
        assert_eq!(second.entries.len(), 2);
        let third = storage
            .list_objects("folders/a/", 2, second.next_token.clone())
            .await
            .unwrap();
        assert_eq!(third.entries.len(), 1);
        assert!(third.next_token.is_none());
    }

    #[tokio::test]
    async fn test_remove_rejects_oversized_batch() {
        let storage = InMemoryStorage::new();
        let keys: Vec<String> = (0..1001).map(|i| i.to_string()).collect();
        let err = storage.remove_objects(&keys).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidRequest(_)));
    }
}
