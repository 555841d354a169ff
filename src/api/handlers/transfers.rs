use crate::AppState;
use crate::api::error::AppError;
use crate::services::transfer::TransferSnapshot;
use axum::{
    Json,
    extract::{Path, State},
};

#[utoipa::path(
    get,
    path = "/transfers/{id}",
    params(
        ("id" = String, Path, description = "Transfer ID")
    ),
    responses(
        (status = 200, description = "Live progress of a running transfer", body = TransferSnapshot),
        (status = 404, description = "No transfer with this id is running")
    ),
    tag = "transfers"
)]
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TransferSnapshot>, AppError> {
    state
        .tracker
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No running transfer {}", id)))
}
