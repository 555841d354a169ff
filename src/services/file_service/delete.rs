use super::{DeletionReport, FileService};
use crate::api::error::AppError;

impl FileService {
    /// Deletes a file or folder and its record.
    ///
    /// Folder members are removed one listing page at a time. A failing page
    /// is logged and counted; later pages are still attempted and the record
    /// is deleted afterwards regardless, which may leave orphan objects.
    pub async fn delete_record(&self, id: &str, code: &str) -> Result<DeletionReport, AppError> {
        let record = self.authorize(id, code).await?;

        let report = if record.is_folder {
            self.remove_folder_objects(&record.file_path).await?
        } else {
            self.remove_file_object(&record.file_path).await
        };

        self.records.delete(&record.id).await?;

        if report.failed_batches > 0 {
            tracing::warn!(
                "⚠️  Record {} deleted, {} objects in {} batches could not be removed",
                record.id,
                report.failed_objects,
                report.failed_batches
            );
        } else {
            tracing::info!(
                "🗑️  Record {} deleted with {} objects",
                record.id,
                report.removed_objects
            );
        }
        Ok(report)
    }

    async fn remove_file_object(&self, key: &str) -> DeletionReport {
        let keys = [key.to_string()];
        match self.storage.remove_objects(&keys).await {
            Ok(()) => DeletionReport {
                removed_objects: 1,
                batches: 1,
                ..Default::default()
            },
            Err(e) => {
                tracing::warn!("⚠️  Failed to remove object {}: {}", key, e);
                DeletionReport {
                    failed_objects: 1,
                    batches: 1,
                    failed_batches: 1,
                    ..Default::default()
                }
            }
        }
    }

    async fn remove_folder_objects(&self, prefix: &str) -> Result<DeletionReport, AppError> {
        let mut report = DeletionReport::default();
        let mut token = None;

        loop {
            let page = self
                .storage
                .list_objects(prefix, self.config.list_page_size, token)
                .await
                .map_err(|e| {
                    tracing::error!("❌ Listing {} for deletion failed: {}", prefix, e);
                    AppError::Internal(format!("Failed to list folder contents: {}", e))
                })?;

            let keys: Vec<String> = page.entries.into_iter().map(|entry| entry.key).collect();
            if !keys.is_empty() {
                report.batches += 1;
                match self.storage.remove_objects(&keys).await {
                    Ok(()) => report.removed_objects += keys.len(),
                    Err(e) => {
                        tracing::warn!(
                            "⚠️  Removal batch {} under {} failed ({} keys): {}",
                            report.batches,
                            prefix,
                            keys.len(),
                            e
                        );
                        report.failed_objects += keys.len();
                        report.failed_batches += 1;
                    }
                }
            }

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(report)
    }
}
