use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Multipart form for `POST /files`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadFileForm {
    pub title: String,
    pub secret_code: String,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Multipart form for `POST /folders`. Each `files` part carries its path
/// relative to the selected directory as its filename.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadFolderForm {
    pub title: Option<String>,
    pub secret_code: String,
    pub strict: Option<bool>,
    pub transfer_id: Option<String>,
    #[schema(value_type = Vec<String>)]
    pub files: Vec<Vec<u8>>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct AccessRequest {
    #[validate(length(min = 1, message = "Secret code is required"))]
    pub code: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct VerifyRequest {
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub verification_code: String,
}

#[derive(Deserialize, IntoParams)]
pub struct CodeQuery {
    /// Secret code of the record
    pub code: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ListFilesQuery {
    /// Case-insensitive title substring
    pub search: Option<String>,
    /// Defaults to 50, capped at 200
    pub limit: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct DownloadFolderQuery {
    pub folder_id: String,
    pub code: Option<String>,
    /// Poll `/transfers/{id}` with this id to follow archive progress
    pub transfer_id: Option<String>,
}
