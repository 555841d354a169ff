mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::*;
use http_body_util::BodyExt;
use secret_drop::services::storage::StorageService;
use serde_json::{Value, json};
use std::io::Read;
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, request).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn upload_folder(app: &Router, title: &str, code: &str, files: &[(&str, &str)]) -> Value {
    let mut parts = vec![Part::Text("title", title), Part::Text("secret_code", code)];
    for (path, content) in files {
        parts.push(Part::File {
            name: "files",
            filename: path,
            content_type: "text/plain",
            data: content.as_bytes(),
        });
    }
    let (status, body) = send_json(app, multipart_request("/folders", &parts)).await;
    assert_eq!(status, StatusCode::OK, "folder upload failed: {}", body);
    body
}

#[tokio::test]
async fn test_health_reports_dependencies() {
    let ctx = setup().await;
    let app = ctx.app();

    let (status, headers, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("x-request-id"));

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["storage"], "connected");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let ctx = setup().await;
    let app = ctx.app();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert_eq!(headers["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_single_file_flow() {
    let ctx = setup().await;
    let app = ctx.app();

    let (status, record) = send_json(
        &app,
        multipart_request(
            "/files",
            &[
                Part::Text("title", "Quarterly"),
                Part::Text("secret_code", "4242"),
                Part::File {
                    name: "file",
                    filename: "q3 résumé.txt",
                    content_type: "text/plain",
                    data: b"numbers",
                },
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["title"], "Quarterly");
    assert_eq!(record["is_folder"], false);
    assert!(record.get("secret_code").is_none());
    let id = record["id"].as_str().unwrap().to_string();

    // Listing ignores case and never exposes codes
    let (status, list) = send_json(&app, get("/files?search=QUARTER")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert!(list[0].get("secret_code").is_none());
    assert!(list[0]["expires_at"].is_string());

    // Wrong code
    let (status, body) = send_json(
        &app,
        json_request("POST", &format!("/files/{}/access", id), json!({ "code": "0000" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid secret code");

    // Signed link with a platform-specific strategy
    let request = Request::builder()
        .method("POST")
        .uri(format!("/files/{}/access", id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::USER_AGENT,
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148",
        )
        .body(Body::from(json!({ "code": "4242" }).to_string()))
        .unwrap();
    let (status, grant) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grant["strategy"], "open_in_new_tab");
    assert_eq!(grant["filename"], "q3 résumé.txt");

    // Fetch-and-save path
    let (status, headers, body) =
        send(&app, get(&format!("/files/{}/content?code=4242", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"numbers");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename*=UTF-8''"));

    // Delete, then the record is gone
    let (status, report) = send_json(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/files/{}?code=4242", id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["removed_objects"], 1);

    let (status, _) = send_json(&app, get(&format!("/files/{}/content?code=4242", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_title_conflict() {
    let ctx = setup().await;
    let app = ctx.app();

    upload_folder(&app, "Shared", "1", &[("shared/a.txt", "a")]).await;
    let puts = ctx.storage.put_count();

    let (status, body) = send_json(
        &app,
        multipart_request(
            "/files",
            &[
                Part::Text("title", "Shared"),
                Part::Text("secret_code", "2"),
                Part::File {
                    name: "file",
                    filename: "b.txt",
                    content_type: "text/plain",
                    data: b"b",
                },
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("Shared"));
    assert_eq!(ctx.storage.put_count(), puts);
}

#[tokio::test]
async fn test_missing_file_is_bad_request() {
    let ctx = setup().await;
    let app = ctx.app();

    let (status, body) = send_json(
        &app,
        multipart_request(
            "/files",
            &[Part::Text("title", "Empty"), Part::Text("secret_code", "1")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file provided");
}

#[tokio::test]
async fn test_folder_archive_download() {
    let ctx = setup().await;
    let app = ctx.app();

    let report = upload_folder(
        &app,
        "Recipes",
        "cook",
        &[
            ("recipes/soup.txt", "water"),
            ("recipes/desserts/cake.txt", "sugar"),
        ],
    )
    .await;
    assert_eq!(report["uploaded"], 2);
    assert_eq!(report["batches"], 1);
    let id = report["record"]["id"].as_str().unwrap().to_string();

    let (status, entries) =
        send_json(&app, get(&format!("/folders/{}/entries?code=cook", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries.as_array().unwrap().len(), 2);

    let (status, _) =
        send_json(&app, get(&format!("/download-folder?folderId={}&code=nope", id))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, headers, body) =
        send(&app, get(&format!("/download-folder?folderId={}&code=cook", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    let transfer_id = headers["x-transfer-id"].to_str().unwrap();
    assert!(transfer_id.starts_with(&format!("archive-{}-", id)));
    assert!(
        headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("Recipes.zip")
    );

    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(body)).unwrap();
    let mut cake = String::new();
    zip.by_name("recipes/desserts/cake.txt")
        .unwrap()
        .read_to_string(&mut cake)
        .unwrap();
    assert_eq!(cake, "sugar");
}

#[tokio::test]
async fn test_empty_folder_download_returns_message() {
    let ctx = setup().await;
    let app = ctx.app();

    let report = upload_folder(&app, "Hollow", "c", &[("hollow/a.txt", "a")]).await;
    let id = report["record"]["id"].as_str().unwrap().to_string();

    // Empty the folder directly in storage
    ctx.storage
        .remove_objects(&[format!("folders/{}/hollow/a.txt", id)])
        .await
        .unwrap();

    let (status, body) =
        send_json(&app, get(&format!("/download-folder?folderId={}&code=c", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("empty"));
    assert_eq!(ctx.storage.get_count(), 0);
}

#[tokio::test]
async fn test_selection_check_reports_plan_and_warnings() {
    let ctx = setup().await;
    let app = ctx.app();

    let files: Vec<Value> = (0..1001)
        .map(|i| json!({ "path": format!("big/{}.bin", i), "size": 10 }))
        .collect();
    let (status, summary) = send_json(
        &app,
        json_request("POST", "/selections/check", json!({ "files": files })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["file_count"], 1001);
    assert_eq!(summary["suggested_title"], "big");
    assert_eq!(summary["warnings"][0]["kind"], "too_many_files");
    assert_eq!(summary["batch_sizes"].as_array().unwrap().len(), 11);

    let (status, _) = send_json(
        &app,
        json_request("POST", "/selections/check", json!({ "files": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/selections/check",
            json!({ "files": [{ "path": "../etc/passwd", "size": 1 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_transfer_is_not_found() {
    let ctx = setup().await;
    let app = ctx.app();

    let (status, _) = send_json(&app, get("/transfers/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_endpoint() {
    let ctx = setup().await;
    let app = ctx.app();

    let report = upload_folder(&app, "Badge", "c", &[("badge/a.txt", "a")]).await;
    let id = report["record"]["id"].as_str().unwrap().to_string();

    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            &format!("/files/{}/verify", id),
            json!({ "verification_code": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, view) = send_json(
        &app,
        json_request(
            "POST",
            &format!("/files/{}/verify", id),
            json!({ "verification_code": VERIFICATION_CODE }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["is_verified"], true);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let ctx = setup().await;
    let app = ctx.app();

    let (status, doc) = send_json(&app, get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/download-folder"].is_object());
    assert!(doc["paths"]["/folders"].is_object());
}
