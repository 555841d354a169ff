#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use sea_orm::{Database, DatabaseConnection};
use secret_drop::config::TransferConfig;
use secret_drop::infrastructure::database;
use secret_drop::services::authorizer::SecretCodeAuthorizer;
use secret_drop::services::file_service::FileService;
use secret_drop::services::memory_storage::InMemoryStorage;
use secret_drop::services::record_store::RecordStore;
use secret_drop::services::storage::{ObjectPage, SignedUrl, StorageError, StorageService};
use secret_drop::services::transfer::{SelectedFile, TransferTracker};
use secret_drop::{AppState, create_app};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const OVERRIDE_CODE: &str = "master-key";
pub const VERIFICATION_CODE: &str = "verify-me";

pub struct TestContext {
    pub db: DatabaseConnection,
    pub storage: Arc<TestStorage>,
    pub tracker: TransferTracker,
    pub service: Arc<FileService>,
    pub config: TransferConfig,
}

impl TestContext {
    pub fn app(&self) -> Router {
        create_app(AppState {
            db: self.db.clone(),
            storage: self.storage.clone(),
            file_service: self.service.clone(),
            tracker: self.tracker.clone(),
            config: self.config.clone(),
        })
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("secret_drop=debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

pub fn test_config() -> TransferConfig {
    TransferConfig {
        override_code: Some(OVERRIDE_CODE.to_string()),
        verification_code: Some(VERIFICATION_CODE.to_string()),
        ..TransferConfig::default()
    }
}

pub async fn setup() -> TestContext {
    setup_with_config(test_config()).await
}

pub async fn setup_with_config(config: TransferConfig) -> TestContext {
    init_tracing();
    let db = setup_test_db().await;
    let storage = Arc::new(TestStorage::default());
    let tracker = TransferTracker::new();
    let service = Arc::new(FileService::new(
        RecordStore::new(db.clone()),
        storage.clone(),
        Arc::new(SecretCodeAuthorizer::new(config.override_code.clone())),
        tracker.clone(),
        config.clone(),
    ));

    TestContext {
        db,
        storage,
        tracker,
        service,
        config,
    }
}

pub fn text_file(path: &str, content: &str) -> SelectedFile {
    SelectedFile {
        relative_path: path.to_string(),
        content_type: "text/plain".to_string(),
        data: Bytes::from(content.to_string()),
    }
}

/// `count` files spread over a few subdirectories of `root`.
pub fn folder_files(root: &str, count: usize) -> Vec<SelectedFile> {
    (0..count)
        .map(|i| text_file(&format!("{}/dir{}/file{:04}.txt", root, i % 3, i), "x"))
        .collect()
}

pub const BOUNDARY: &str = "secret-drop-test-boundary";

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// In-memory storage with call counters, injected failures and slow transfers.
#[derive(Default)]
pub struct TestStorage {
    inner: InMemoryStorage,
    failing: Mutex<HashSet<String>>,
    transfer_delay_ms: AtomicU64,
    puts: AtomicUsize,
    gets: AtomicUsize,
    remove_calls: AtomicUsize,
}

impl TestStorage {
    /// Every later put, get or remove of a key ending in `suffix` fails.
    pub fn fail_matching(&self, suffix: &str) {
        self.failing.lock().unwrap().insert(suffix.to_string());
    }

    /// Every later put and get waits `delay` first.
    pub fn delay_transfers(&self, delay: Duration) {
        self.transfer_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn advance_clock(&self, by: chrono::Duration) {
        self.inner.advance_clock(by);
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn remove_call_count(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn object_count(&self) -> usize {
        self.inner.object_count()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    fn check(&self, key: &str) -> Result<(), StorageError> {
        let failing = self.failing.lock().unwrap();
        if failing.iter().any(|suffix| key.ends_with(suffix.as_str())) {
            return Err(StorageError::Backend(anyhow::anyhow!(
                "injected failure for {}",
                key
            )));
        }
        Ok(())
    }

    async fn pause(&self) {
        let delay = self.transfer_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[async_trait]
impl StorageService for TestStorage {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(key)?;
        self.inner.put_object(key, data, content_type).await
    }

    async fn remove_objects(&self, keys: &[String]) -> Result<(), StorageError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        for key in keys {
            self.check(key)?;
        }
        self.inner.remove_objects(keys).await
    }

    async fn list_objects(
        &self,
        prefix: &str,
        limit: i32,
        continuation: Option<String>,
    ) -> Result<ObjectPage, StorageError> {
        self.inner.list_objects(prefix, limit, continuation).await
    }

    async fn create_signed_url(&self, key: &str, ttl_secs: u64) -> Result<SignedUrl, StorageError> {
        self.inner.create_signed_url(key, ttl_secs).await
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(key)?;
        self.inner.get_object(key).await
    }

    async fn fetch_signed_url(&self, url: &str) -> Result<Bytes, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.inner.fetch_signed_url(url).await
    }

    async fn ping(&self) -> bool {
        self.inner.ping().await
    }
}
