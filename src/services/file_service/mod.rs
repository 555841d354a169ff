pub mod access;
pub mod delete;
pub mod types;
pub mod upload;

pub use types::*;

use crate::api::error::AppError;
use crate::config::TransferConfig;
use crate::services::archive::FolderArchiver;
use crate::services::authorizer::Authorizer;
use crate::services::record_store::RecordStore;
use crate::services::storage::StorageService;
use crate::services::transfer::{BatchRunner, SelectionLimits, TransferTracker};
use std::sync::Arc;
use std::time::Duration;

/// Storage key prefix under which a folder's members live.
pub fn folder_prefix(record_id: &str) -> String {
    format!("folders/{}/", record_id)
}

pub fn file_key(record_id: &str, filename: &str) -> String {
    format!("files/{}/{}", record_id, filename)
}

pub struct FileService {
    records: RecordStore,
    storage: Arc<dyn StorageService>,
    authorizer: Arc<dyn Authorizer>,
    tracker: TransferTracker,
    archiver: FolderArchiver,
    config: TransferConfig,
}

impl FileService {
    pub fn new(
        records: RecordStore,
        storage: Arc<dyn StorageService>,
        authorizer: Arc<dyn Authorizer>,
        tracker: TransferTracker,
        config: TransferConfig,
    ) -> Self {
        let archiver = FolderArchiver::new(
            storage.clone(),
            BatchRunner::new(config.max_batch_size),
            config.list_page_size,
        );
        Self {
            records,
            storage,
            authorizer,
            tracker,
            archiver,
            config,
        }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    fn runner(&self) -> BatchRunner {
        BatchRunner::new(self.config.max_batch_size)
    }

    fn limits(&self) -> SelectionLimits {
        SelectionLimits {
            max_files: self.config.max_files,
            max_total_bytes: self.config.max_total_bytes,
            batch_size: self.config.max_batch_size,
        }
    }

    fn slow_notice(&self) -> Duration {
        Duration::from_secs(self.config.slow_notice_secs)
    }

    /// Titles must be unique. Checked before any storage write; the UNIQUE
    /// constraint still catches uploads that race past this check.
    async fn ensure_title_available(&self, title: &str) -> Result<(), AppError> {
        if self.records.title_exists(title).await? {
            tracing::info!("Rejected upload: title '{}' already exists", title);
            return Err(AppError::Conflict(format!(
                "Title '{}' is already in use",
                title
            )));
        }
        Ok(())
    }
}
