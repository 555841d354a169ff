use super::{AccessGrant, DeliveryStrategy, FileContent, FileRecordView, FileService, FolderEntry};
use crate::api::error::AppError;
use crate::entities::file_records;
use crate::services::archive::ArchiveOutcome;
use crate::services::record_store::RecordFilter;
use crate::services::transfer::{TransferKind, TransferPhase};
use uuid::Uuid;

/// Listing page size used when the caller gives none
pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 200;

impl FileService {
    /// Loads a record and checks the supplied code against it.
    pub async fn authorize(&self, id: &str, code: &str) -> Result<file_records::Model, AppError> {
        let record = self.records.find_by_id(id).await?;
        if !self.authorizer.can_access(&record, code) {
            tracing::warn!("🔒 Access denied for record {}", id);
            return Err(AppError::access_denied());
        }
        Ok(record)
    }

    fn reject_folder(record: &file_records::Model) -> Result<(), AppError> {
        if record.is_folder {
            return Err(AppError::BadRequest(
                "Folders are downloaded as a ZIP archive".to_string(),
            ));
        }
        Ok(())
    }

    /// Issues a short-lived signed link for a single file.
    pub async fn grant_access(
        &self,
        id: &str,
        code: &str,
        user_agent: Option<&str>,
    ) -> Result<AccessGrant, AppError> {
        let record = self.authorize(id, code).await?;
        Self::reject_folder(&record)?;

        let signed = self
            .storage
            .create_signed_url(&record.file_path, self.config.signed_url_ttl_secs)
            .await?;
        let strategy = DeliveryStrategy::from_user_agent(user_agent);
        tracing::info!("🔗 Signed link issued for {} ({:?})", record.id, strategy);

        Ok(AccessGrant {
            url: signed.url,
            filename: record.filename,
            content_type: record
                .content_type
                .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string()),
            size: record.size,
            strategy,
            expires_at: signed.expires_at,
        })
    }

    /// Fetch-and-save path: resolves a fresh signed link server-side and returns the bytes.
    pub async fn fetch_content(&self, id: &str, code: &str) -> Result<FileContent, AppError> {
        let record = self.authorize(id, code).await?;
        Self::reject_folder(&record)?;

        let signed = self
            .storage
            .create_signed_url(&record.file_path, self.config.signed_url_ttl_secs)
            .await?;
        let data = self.storage.fetch_signed_url(&signed.url).await?;

        Ok(FileContent {
            filename: record.filename,
            content_type: record
                .content_type
                .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string()),
            data,
        })
    }

    /// Newest first. `search` matches anywhere in the title, ignoring case.
    pub async fn list_records(
        &self,
        search: Option<String>,
        limit: Option<u64>,
    ) -> Result<Vec<FileRecordView>, AppError> {
        let filter = RecordFilter {
            title_contains: search.map(|s| s.trim().to_string()),
            limit: Some(
                limit
                    .unwrap_or(DEFAULT_LIST_LIMIT)
                    .clamp(1, MAX_LIST_LIMIT),
            ),
        };
        let records = self.records.select_where(&filter).await?;
        Ok(records
            .iter()
            .map(|r| FileRecordView::from_model(r, self.config.display_expiry_days))
            .collect())
    }

    /// Member objects of a folder with paths relative to the folder root.
    pub async fn folder_entries(&self, id: &str, code: &str) -> Result<Vec<FolderEntry>, AppError> {
        let record = self.authorize(id, code).await?;
        if !record.is_folder {
            return Err(AppError::BadRequest("Record is not a folder".to_string()));
        }

        let members = self.archiver.list_members(&record.file_path).await?;
        Ok(members
            .into_iter()
            .map(|entry| FolderEntry {
                path: entry
                    .key
                    .strip_prefix(record.file_path.as_str())
                    .unwrap_or(&entry.key)
                    .to_string(),
                size: entry.size,
            })
            .collect())
    }

    /// Builds the folder's ZIP archive once the code checks out.
    pub async fn download_folder(
        &self,
        id: &str,
        code: &str,
        transfer_id: Option<String>,
    ) -> Result<ArchiveOutcome, AppError> {
        let record = self.authorize(id, code).await?;
        if !record.is_folder {
            return Err(AppError::BadRequest("Record is not a folder".to_string()));
        }

        // Concurrent downloads of one folder each get their own entry
        let transfer_id = transfer_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("archive-{}-{}", record.id, Uuid::new_v4().simple()));
        let mut transfer = self.tracker.begin(
            &transfer_id,
            TransferKind::Archive,
            TransferPhase::ListingFiles,
            0,
        )?;
        transfer.arm_slow_notice(self.slow_notice());

        Ok(self
            .archiver
            .build(&transfer, &record.file_path, &record.title)
            .await?)
    }

    /// Sets the verified badge when the configured verification code matches.
    pub async fn verify_record(
        &self,
        id: &str,
        verification_code: &str,
    ) -> Result<FileRecordView, AppError> {
        let Some(expected) = self.config.verification_code.as_deref() else {
            return Err(AppError::BadRequest(
                "Verification is not enabled".to_string(),
            ));
        };
        if verification_code.is_empty() || verification_code != expected {
            tracing::warn!("🔒 Wrong verification code for record {}", id);
            return Err(AppError::access_denied());
        }

        let record = self.records.update_verification(id, true).await?;
        tracing::info!("✅ Record {} marked as verified", id);
        Ok(FileRecordView::from_model(
            &record,
            self.config.display_expiry_days,
        ))
    }
}
