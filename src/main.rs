use clap::Parser;
use dotenvy::dotenv;
use secret_drop::config::TransferConfig;
use secret_drop::infrastructure::{database, storage};
use secret_drop::services::authorizer::SecretCodeAuthorizer;
use secret_drop::services::file_service::FileService;
use secret_drop::services::record_store::RecordStore;
use secret_drop::services::transfer::TransferTracker;
use secret_drop::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Object storage backend: `s3` (MinIO/S3) or `memory`
    #[arg(long, env = "STORAGE_BACKEND", default_value = "s3")]
    storage: String,

    /// Use development defaults (small batches, dev override code)
    #[arg(long, conflicts_with = "production")]
    dev: bool,

    /// Require production settings such as OVERRIDE_CODE
    #[arg(long)]
    production: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "secret_drop=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting secret-drop...");

    // Setup Infrastructure
    let db = database::setup_database().await?;
    let storage_service = storage::setup_storage(&args.storage).await?;

    let config = if args.dev {
        TransferConfig::development()
    } else if args.production {
        TransferConfig::production()?
    } else {
        TransferConfig::from_env()
    };
    info!(
        "🛡️  Transfer Config: Batch={}, Max Files={}, Max Size={}MB, Link TTL={}s, Override Code={}",
        config.max_batch_size,
        config.max_files,
        config.max_total_bytes / 1024 / 1024,
        config.signed_url_ttl_secs,
        if config.override_code.is_some() { "set" } else { "unset" }
    );

    let tracker = TransferTracker::new();
    let file_service = Arc::new(FileService::new(
        RecordStore::new(db.clone()),
        storage_service.clone(),
        Arc::new(SecretCodeAuthorizer::new(config.override_code.clone())),
        tracker.clone(),
        config.clone(),
    ));

    let state = AppState {
        db: db.clone(),
        storage: storage_service,
        file_service,
        tracker,
        config,
    };

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                // Path only: query strings carry secret codes
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri().path());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
