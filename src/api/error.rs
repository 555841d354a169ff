use crate::services::archive::ArchiveError;
use crate::services::record_store::RecordError;
use crate::services::storage::StorageError;
use crate::services::transfer::TrackerError;
use crate::services::transfer::selection::SelectionError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Link Expired")]
    Gone(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Service Unavailable: {0}")]
    Unavailable(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn access_denied() -> Self {
        AppError::Forbidden("Invalid secret code".to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object not found: {}", key)),
            StorageError::Expired => {
                AppError::Gone("Link expired, request a new one".to_string())
            }
            StorageError::InvalidRequest(msg) => AppError::BadRequest(msg),
            StorageError::Backend(e) => AppError::Internal(format!("Storage error: {}", e)),
        }
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::DuplicateTitle(title) => {
                AppError::Conflict(format!("Title '{}' is already in use", title))
            }
            RecordError::NotFound(id) => AppError::NotFound(format!("Record {} not found", id)),
            RecordError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<SelectionError> for AppError {
    fn from(err: SelectionError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        match &err {
            ArchiveError::Fetch(failed) => {
                for failure in failed {
                    tracing::warn!("Archive member {} failed: {}", failure.item, failure.error);
                }
            }
            ArchiveError::Listing(_) | ArchiveError::Write(_) => {}
        }
        tracing::error!("Folder archive failed: {}", err);
        AppError::Unavailable(
            "The folder could not be packaged right now, please try again later".to_string(),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Forbidden(msg) => {
                tracing::warn!("Access denied: {}", msg);
                (StatusCode::FORBIDDEN, msg)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Gone(msg) => (StatusCode::GONE, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Unavailable(msg) => {
                tracing::error!("Unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}
