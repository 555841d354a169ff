use crate::AppState;
use crate::api::error::AppError;
use crate::services::archive::ArchiveOutcome;
use crate::services::file_service::FolderEntry;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
};

use super::download::{attachment_response, resolve_file_headers};
use super::types::*;

/// Names the progress entry of the archive that produced the response
pub const TRANSFER_ID_HEADER: &str = "x-transfer-id";

#[utoipa::path(
    get,
    path = "/download-folder",
    params(DownloadFolderQuery),
    responses(
        (status = 200, description = "ZIP archive of the folder, or a message when the folder is empty", body = MessageResponse),
        (status = 403, description = "Invalid secret code"),
        (status = 404, description = "Folder not found"),
        (status = 409, description = "Requested transfer id is already running"),
        (status = 503, description = "Archive could not be built, retry later")
    ),
    tag = "folders"
)]
pub async fn download_folder(
    State(state): State<AppState>,
    Query(query): Query<DownloadFolderQuery>,
) -> Result<Response, AppError> {
    let code = query.code.unwrap_or_default();
    let outcome = state
        .file_service
        .download_folder(&query.folder_id, &code, query.transfer_id)
        .await?;

    match outcome {
        ArchiveOutcome::Empty => Ok(Json(MessageResponse {
            message: "This folder is empty, there is nothing to download".to_string(),
        })
        .into_response()),
        ArchiveOutcome::Ready(archive) => {
            let (content_type, content_disposition) =
                resolve_file_headers(&archive.filename, "application/zip");
            tracing::info!(
                "📦 Sending {} ({} files, {} bytes)",
                archive.filename,
                archive.file_count,
                archive.data.len()
            );
            let mut response =
                attachment_response(content_type, content_disposition, Body::from(archive.data))?;
            if let Ok(value) = HeaderValue::from_str(&archive.transfer_id) {
                response.headers_mut().insert(TRANSFER_ID_HEADER, value);
            }
            Ok(response)
        }
    }
}

#[utoipa::path(
    get,
    path = "/folders/{id}/entries",
    params(
        ("id" = String, Path, description = "Folder record ID"),
        CodeQuery
    ),
    responses(
        (status = 200, description = "Member files relative to the folder root", body = Vec<FolderEntry>),
        (status = 400, description = "Record is not a folder"),
        (status = 403, description = "Invalid secret code"),
        (status = 404, description = "Folder not found")
    ),
    tag = "folders"
)]
pub async fn folder_entries(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<Vec<FolderEntry>>, AppError> {
    let code = query.code.unwrap_or_default();
    let entries = state.file_service.folder_entries(&id, &code).await?;
    Ok(Json(entries))
}
