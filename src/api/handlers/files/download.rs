use crate::AppState;
use crate::api::error::AppError;
use crate::services::file_service::AccessGrant;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use validator::Validate;

use super::types::*;

#[utoipa::path(
    post,
    path = "/files/{id}/access",
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    request_body = AccessRequest,
    responses(
        (status = 200, description = "Short-lived signed link and delivery strategy", body = AccessGrant),
        (status = 400, description = "Record is a folder"),
        (status = 403, description = "Invalid secret code"),
        (status = 404, description = "Record not found")
    ),
    tag = "files"
)]
pub async fn grant_access(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<AccessRequest>,
) -> Result<Json<AccessGrant>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());

    let grant = state
        .file_service
        .grant_access(&id, &req.code, user_agent)
        .await?;
    Ok(Json(grant))
}

#[utoipa::path(
    get,
    path = "/files/{id}/content",
    params(
        ("id" = String, Path, description = "Record ID"),
        CodeQuery
    ),
    responses(
        (status = 200, description = "File bytes as an attachment"),
        (status = 403, description = "Invalid secret code"),
        (status = 404, description = "Record not found"),
        (status = 410, description = "Signed link expired")
    ),
    tag = "files"
)]
pub async fn download_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CodeQuery>,
) -> Result<Response, AppError> {
    let code = query.code.unwrap_or_default();
    let content = state.file_service.fetch_content(&id, &code).await?;

    let (content_type, content_disposition) =
        resolve_file_headers(&content.filename, &content.content_type);
    tracing::info!("📥 Serving {} ({} bytes)", content.filename, content.data.len());

    attachment_response(content_type, content_disposition, Body::from(content.data))
}

pub(crate) fn attachment_response(
    content_type: String,
    content_disposition: String,
    body: Body,
) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

/// Content type (sniffed from the extension when the stored one is generic)
/// and an attachment `Content-Disposition` with an RFC 5987 UTF-8 filename.
pub(crate) fn resolve_file_headers(filename: &str, stored_type: &str) -> (String, String) {
    let mut content_type = stored_type.to_string();

    if content_type.is_empty() || content_type == "application/octet-stream" {
        let extension = filename.split('.').next_back().unwrap_or("").to_lowercase();
        content_type = match extension.as_str() {
            "mp4" => "video/mp4",
            "mp3" => "audio/mpeg",
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "pdf" => "application/pdf",
            "txt" => "text/plain",
            "zip" => "application/zip",
            _ => "application/octet-stream",
        }
        .to_string();
    }

    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64)
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    let content_disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    );

    (content_type, content_disposition)
}
