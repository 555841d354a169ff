use crate::entities::file_records;
use crate::services::transfer::{SelectedFile, SelectionSummary, TransferFailure};
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

pub struct SingleUpload {
    pub title: String,
    pub secret_code: String,
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

pub struct FolderUpload {
    /// Falls back to the selection's top-level directory when absent
    pub title: Option<String>,
    pub secret_code: String,
    /// Refuse selections that trip a size or count warning
    pub strict: bool,
    /// Client-chosen id for polling `/transfers/{id}`; defaults to the record id
    pub transfer_id: Option<String>,
    pub files: Vec<SelectedFile>,
}

/// Public view of a record. The secret code never leaves the service.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileRecordView {
    pub id: String,
    pub title: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub is_folder: bool,
    pub file_count: Option<i32>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    /// Informational only; records are not removed automatically
    pub expires_at: DateTime<Utc>,
}

impl FileRecordView {
    pub fn from_model(model: &file_records::Model, expiry_days: i64) -> Self {
        Self {
            id: model.id.clone(),
            title: model.title.clone(),
            filename: model.filename.clone(),
            content_type: model.content_type.clone(),
            size: model.size,
            is_folder: model.is_folder,
            file_count: model.file_count,
            is_verified: model.is_verified.unwrap_or(false),
            created_at: model.created_at,
            expires_at: model.created_at + Duration::days(expiry_days),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FolderUploadReport {
    pub record: FileRecordView,
    pub transfer_id: String,
    pub summary: SelectionSummary,
    pub uploaded: usize,
    pub failed: Vec<TransferFailure>,
    pub batches: usize,
}

/// How the client should hand a signed link to the user.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStrategy {
    /// Platforms that block programmatic saves (iOS, iPadOS)
    OpenInNewTab,
    FetchAndSave,
}

impl DeliveryStrategy {
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return DeliveryStrategy::FetchAndSave;
        };
        let ua = ua.to_ascii_lowercase();
        // iPadOS 13+ reports a desktop Safari UA but keeps the "mobile/" token
        let ipad_desktop_mode = ua.contains("macintosh") && ua.contains("mobile/");
        if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") || ipad_desktop_mode
        {
            DeliveryStrategy::OpenInNewTab
        } else {
            DeliveryStrategy::FetchAndSave
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccessGrant {
    pub url: String,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub strategy: DeliveryStrategy,
    pub expires_at: DateTime<Utc>,
}

pub struct FileContent {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema, PartialEq)]
pub struct DeletionReport {
    pub removed_objects: usize,
    pub failed_objects: usize,
    pub batches: usize,
    pub failed_batches: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct FolderEntry {
    /// Path relative to the folder root
    pub path: String,
    pub size: i64,
}
