use crate::AppState;
use crate::api::error::AppError;
use crate::services::file_service::FileRecordView;
use axum::{
    Json,
    extract::{Query, State},
};

use super::types::*;

#[utoipa::path(
    get,
    path = "/files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Records, newest first", body = Vec<FileRecordView>)
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<Vec<FileRecordView>>, AppError> {
    let records = state
        .file_service
        .list_records(query.search, query.limit)
        .await?;
    Ok(Json(records))
}
