use crate::AppState;
use crate::api::error::AppError;
use crate::services::file_service::{DeletionReport, FileRecordView};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use super::types::*;

#[utoipa::path(
    delete,
    path = "/files/{id}",
    params(
        ("id" = String, Path, description = "Record ID"),
        CodeQuery
    ),
    responses(
        (status = 200, description = "Record deleted; failed removal batches are counted", body = DeletionReport),
        (status = 403, description = "Invalid secret code"),
        (status = 404, description = "Record not found")
    ),
    tag = "files"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<DeletionReport>, AppError> {
    let code = query.code.unwrap_or_default();
    let report = state.file_service.delete_record(&id, &code).await?;
    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/files/{id}/verify",
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Record marked as verified", body = FileRecordView),
        (status = 400, description = "Verification disabled"),
        (status = 403, description = "Invalid verification code"),
        (status = 404, description = "Record not found")
    ),
    tag = "files"
)]
pub async fn verify_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<FileRecordView>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let view = state
        .file_service
        .verify_record(&id, &req.verification_code)
        .await?;
    Ok(Json(view))
}
