pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::TransferConfig;
use crate::services::file_service::FileService;
use crate::services::storage::StorageService;
use crate::services::transfer::TransferTracker;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::selections::check_selection,
        api::handlers::files::upload::upload_file,
        api::handlers::files::upload::upload_folder,
        api::handlers::files::list::list_files,
        api::handlers::files::download::grant_access,
        api::handlers::files::download::download_content,
        api::handlers::files::manage::delete_item,
        api::handlers::files::manage::verify_item,
        api::handlers::files::archive::folder_entries,
        api::handlers::files::archive::download_folder,
        api::handlers::transfers::get_transfer,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::selections::SelectionCheckRequest,
            api::handlers::selections::SelectionEntry,
            api::handlers::files::MessageResponse,
            api::handlers::files::UploadFileForm,
            api::handlers::files::UploadFolderForm,
            api::handlers::files::AccessRequest,
            api::handlers::files::VerifyRequest,
            services::file_service::FileRecordView,
            services::file_service::FolderUploadReport,
            services::file_service::AccessGrant,
            services::file_service::DeliveryStrategy,
            services::file_service::DeletionReport,
            services::file_service::FolderEntry,
            services::transfer::SelectionSummary,
            services::transfer::selection::SelectionWarning,
            services::transfer::TransferFailure,
            services::transfer::TransferSnapshot,
            services::transfer::TransferKind,
            services::transfer::TransferPhase,
        )
    ),
    tags(
        (name = "files", description = "File upload, access and deletion"),
        (name = "folders", description = "Folder listing and archive download"),
        (name = "transfers", description = "Live transfer progress"),
        (name = "system", description = "Health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub file_service: Arc<FileService>,
    pub tracker: TransferTracker,
    pub config: TransferConfig,
}

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/selections/check",
            post(api::handlers::selections::check_selection),
        )
        .route(
            "/files",
            get(api::handlers::files::list_files).post(api::handlers::files::upload_file),
        )
        .route("/folders", post(api::handlers::files::upload_folder))
        .route(
            "/files/:id",
            axum::routing::delete(api::handlers::files::delete_item),
        )
        .route(
            "/files/:id/access",
            post(api::handlers::files::grant_access),
        )
        .route(
            "/files/:id/content",
            get(api::handlers::files::download_content),
        )
        .route("/files/:id/verify", post(api::handlers::files::verify_item))
        .route(
            "/folders/:id/entries",
            get(api::handlers::files::folder_entries),
        )
        .route(
            "/download-folder",
            get(api::handlers::files::download_folder),
        )
        .route(
            "/transfers/:id",
            get(api::handlers::transfers::get_transfer),
        )
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors)
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}
