use super::{FileRecordView, FileService, FolderUpload, FolderUploadReport, SingleUpload};
use super::{file_key, folder_prefix};
use crate::api::error::AppError;
use crate::entities::file_records;
use crate::services::record_store::NewRecord;
use crate::services::transfer::selection::{normalize_relative_path, summarize};
use crate::services::transfer::{
    SelectedFile, Selection, SelectionError, SelectionSummary, TransferFailure, TransferKind,
    TransferPhase, TransferProgress,
};
use crate::utils::validation::{sanitize_filename, validate_secret_code, validate_title};
use uuid::Uuid;

impl FileService {
    /// Summarizes a prospective selection from `(relative_path, size)` pairs
    /// without transferring anything.
    pub fn check_selection(
        &self,
        entries: Vec<(String, u64)>,
    ) -> Result<SelectionSummary, AppError> {
        if entries.is_empty() {
            return Err(SelectionError::Empty.into());
        }
        let normalized = entries
            .into_iter()
            .map(|(path, size)| normalize_relative_path(&path).map(|p| (p, size)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summarize(
            normalized.iter().map(|(p, s)| (p.as_str(), *s)),
            &self.limits(),
        ))
    }

    /// Single files skip batching: title check, put, then record insert.
    pub async fn upload_single(
        &self,
        upload: SingleUpload,
    ) -> Result<file_records::Model, AppError> {
        let title = validate_title(&upload.title).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let secret_code = validate_secret_code(&upload.secret_code)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let filename =
            sanitize_filename(&upload.filename).map_err(|e| AppError::BadRequest(e.to_string()))?;

        self.ensure_title_available(&title).await?;

        let id = Uuid::new_v4().to_string();
        let key = file_key(&id, &filename);
        let size = upload.data.len() as i64;

        tracing::info!("📤 Uploading '{}' ({} bytes) to {}", filename, size, key);
        self.storage
            .put_object(&key, upload.data, &upload.content_type)
            .await?;

        let inserted = self
            .records
            .insert(NewRecord {
                id,
                title,
                filename,
                file_path: key.clone(),
                secret_code,
                content_type: Some(upload.content_type),
                size,
                is_folder: false,
                file_count: None,
            })
            .await;

        match inserted {
            Ok(record) => {
                tracing::info!("✅ File record {} created", record.id);
                Ok(record)
            }
            Err(e) => {
                tracing::error!("❌ Record insert failed for {}, removing object: {}", key, e);
                if let Err(cleanup) = self.storage.remove_objects(&[key.clone()]).await {
                    tracing::warn!("⚠️  Orphan object {} left behind: {}", key, cleanup);
                }
                Err(e.into())
            }
        }
    }

    /// Uploads a directory tree as one folder record plus one object per member.
    ///
    /// The record is created first; if that fails nothing is written. Member
    /// uploads then run in batches and individual failures are reported, not
    /// retried.
    pub async fn upload_folder(
        &self,
        upload: FolderUpload,
    ) -> Result<FolderUploadReport, AppError> {
        let secret_code = validate_secret_code(&upload.secret_code)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let selection = Selection::new(upload.files)?;
        let summary = selection.summary(&self.limits());
        summary.enforce(upload.strict)?;
        for warning in &summary.warnings {
            tracing::warn!("⚠️  Large selection: {}", warning);
        }

        let raw_title = upload
            .title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| summary.suggested_title.clone())
            .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?;
        let title = validate_title(&raw_title).map_err(|e| AppError::BadRequest(e.to_string()))?;

        self.ensure_title_available(&title).await?;

        let id = Uuid::new_v4().to_string();
        let prefix = folder_prefix(&id);
        let transfer_id = upload
            .transfer_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| id.clone());

        // Claimed before the record exists so a clashing id writes nothing
        let mut transfer = self.tracker.begin(
            &transfer_id,
            TransferKind::Upload,
            TransferPhase::Uploading,
            summary.file_count,
        )?;
        transfer.arm_slow_notice(self.slow_notice());

        let record = self
            .records
            .insert(NewRecord {
                id,
                title: title.clone(),
                filename: title,
                file_path: prefix.clone(),
                secret_code,
                content_type: None,
                size: summary.total_bytes as i64,
                is_folder: true,
                file_count: Some(summary.file_count as i32),
            })
            .await
            .map_err(|e| {
                tracing::error!("❌ Folder record creation failed, aborting upload: {}", e);
                AppError::from(e)
            })?;

        tracing::info!(
            "📁 Uploading folder '{}' ({} files, {} bytes) in {} batches",
            record.title,
            summary.file_count,
            summary.total_bytes,
            summary.batch_sizes.len()
        );

        let progress =
            TransferProgress::with_observer(summary.file_count, transfer.progress_observer());

        let storage = &self.storage;
        let prefix = prefix.as_str();
        let result = self
            .runner()
            .run(selection.into_files(), &progress, |file: SelectedFile| async move {
                let key = format!("{}{}", prefix, file.relative_path);
                match storage.put_object(&key, file.data, &file.content_type).await {
                    Ok(()) => Ok(file.relative_path),
                    Err(e) => Err(TransferFailure::new(file.relative_path, e)),
                }
            })
            .await;

        drop(transfer);

        if result.is_complete() {
            tracing::info!(
                "✅ Folder {} uploaded: {} files in {} batches",
                record.id,
                result.succeeded.len(),
                result.batches
            );
        } else {
            tracing::warn!(
                "⚠️  Folder {} uploaded with {} of {} files failing",
                record.id,
                result.failed.len(),
                result.processed()
            );
        }

        Ok(FolderUploadReport {
            record: FileRecordView::from_model(&record, self.config.display_expiry_days),
            transfer_id,
            summary,
            uploaded: result.succeeded.len(),
            failed: result.failed,
            batches: result.batches,
        })
    }
}
