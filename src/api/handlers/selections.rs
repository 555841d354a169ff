use crate::AppState;
use crate::api::error::AppError;
use crate::services::transfer::SelectionSummary;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SelectionEntry {
    /// Path relative to the selected directory, or the bare filename
    pub path: String,
    pub size: u64,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct SelectionCheckRequest {
    #[validate(length(min = 1, message = "No files selected"))]
    pub files: Vec<SelectionEntry>,
}

#[utoipa::path(
    post,
    path = "/selections/check",
    request_body = SelectionCheckRequest,
    responses(
        (status = 200, description = "Totals, warnings, suggested title and batch plan", body = SelectionSummary),
        (status = 400, description = "Empty selection or invalid path")
    ),
    tag = "files"
)]
pub async fn check_selection(
    State(state): State<AppState>,
    Json(req): Json<SelectionCheckRequest>,
) -> Result<Json<SelectionSummary>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let entries = req.files.into_iter().map(|f| (f.path, f.size)).collect();
    let summary = state.file_service.check_selection(entries)?;
    Ok(Json(summary))
}
