use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;

/// Emits one structured `metrics` event per request with its latency.
/// Transfer endpoints are tagged so slow uploads and archives stand out.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let transfer = is_transfer_path(&path);

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status();

    info!(
        target: "metrics",
        method = %method,
        path = %path,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        transfer = transfer,
        "request_completed"
    );

    response
}

fn is_transfer_path(path: &str) -> bool {
    path == "/folders" || path == "/download-folder" || path.ends_with("/content")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_paths_are_tagged() {
        assert!(is_transfer_path("/folders"));
        assert!(is_transfer_path("/download-folder"));
        assert!(is_transfer_path("/files/abc/content"));
        assert!(!is_transfer_path("/files"));
        assert!(!is_transfer_path("/health"));
    }
}
