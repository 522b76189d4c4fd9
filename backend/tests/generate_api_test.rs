//! Integration tests for the HTTP surface
//!
//! Drives the full router with `tower::ServiceExt::oneshot` against a
//! mockito stand-in for the completion API.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use mockito::{Matcher, Server, ServerGuard};
use std::path::Path;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt;
use zipgpt_backend::api;
use zipgpt_backend::config::Config;
use zipgpt_backend::exchange::{archive, ExchangeHandler};

const BOUNDARY: &str = "zipgpt-test-boundary";

struct TestApp {
    router: Router,
    scratch: TempDir,
}

fn build_app(server: &ServerGuard, max_upload_bytes: Option<&str>) -> TestApp {
    let scratch = tempdir().expect("Failed to create temp dir");
    let base_url = server.url();
    let scratch_path = scratch.path().to_string_lossy().to_string();
    let max_upload_bytes = max_upload_bytes.map(str::to_string);

    let config = Config::from_lookup(move |key| match key {
        "OPENAI_API_KEY" => Some("test-key".to_string()),
        "ZIP_PASSWORD" => Some("secret".to_string()),
        "OPENAI_API_BASE" => Some(base_url.clone()),
        "SCRATCH_DIR" => Some(scratch_path.clone()),
        "MAX_UPLOAD_BYTES" => max_upload_bytes.clone(),
        _ => None,
    })
    .expect("config should load");

    let handler = ExchangeHandler::new(Arc::new(config)).expect("handler should build");
    TestApp {
        router: api::router(Arc::new(handler)),
        scratch,
    }
}

fn prompt_archive(entry: &str, contents: &str, password: &str) -> Vec<u8> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("input.zip");
    archive::write_entry(&path, entry, contents.as_bytes(), password).unwrap();
    std::fs::read(&path).unwrap()
}

fn reply_text(bytes: &[u8], password: &str) -> String {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("output.zip");
    std::fs::write(&path, bytes).unwrap();

    let zip = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(zip.len(), 1, "reply archive must hold exactly one entry");

    let reply = archive::read_entry(&path, archive::OUTPUT_ENTRY, password, 1 << 20).unwrap();
    String::from_utf8(reply).unwrap()
}

/// Build a multipart/form-data request with one part
fn multipart_request(field: &str, filename: Option<&str>, data: &[u8]) -> Request<Body> {
    let disposition = match filename {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/zip\r\n",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n{}\r\n", BOUNDARY, disposition).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/generate")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn error_message(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    json["error"].as_str().unwrap_or_default().to_string()
}

fn assert_scratch_empty(scratch: &Path) {
    let leftovers = std::fs::read_dir(scratch).unwrap().count();
    assert_eq!(leftovers, 0, "scratch area was not cleaned up");
}

fn completion_body(text: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]
    })
    .to_string()
}

#[tokio::test]
async fn test_liveness() {
    let server = Server::new_async().await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("running"));
}

#[tokio::test]
async fn test_upload_form() {
    let server = Server::new_async().await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(Request::builder().uri("/upload").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8_lossy(&bytes);
    assert!(html.contains("action=\"/generate\""));
    assert!(html.contains("name=\"file\""));
}

#[tokio::test]
async fn test_health_check() {
    let server = Server::new_async().await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_generate_hello_returns_hi_there() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::Json(serde_json::json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .with_status(200)
        .with_body(completion_body("Hi there"))
        .create_async()
        .await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(multipart_request(
            "file",
            Some("input.zip"),
            &prompt_archive("input.txt", "Hello", "secret"),
        ))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"output.zip\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(reply_text(&bytes, "secret"), "Hi there");
    assert_scratch_empty(app.scratch.path());
}

#[tokio::test]
async fn test_generate_echo_preserves_prompt() {
    let prompt = "Multi-line prompt\nwith ünïcödé ✓ and \"quotes\"";
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(prompt))
        .create_async()
        .await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(multipart_request(
            "file",
            Some("input.zip"),
            &prompt_archive("input.txt", &format!("  {}\n\n", prompt), "secret"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(reply_text(&bytes, "secret"), prompt);
}

#[tokio::test]
async fn test_generate_missing_file_field() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(multipart_request("notes", None, b"hello"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("Missing file parameter"));
}

#[tokio::test]
async fn test_generate_wrong_filename() {
    let server = Server::new_async().await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(multipart_request(
            "file",
            Some("prompt.zip"),
            &prompt_archive("input.txt", "Hello", "secret"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("input.zip"));
}

#[tokio::test]
async fn test_generate_wrong_password_never_calls_upstream() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(multipart_request(
            "file",
            Some("input.zip"),
            &prompt_archive("input.txt", "Hello", "wrong"),
        ))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_scratch_empty(app.scratch.path());
}

#[tokio::test]
async fn test_generate_missing_entry_never_calls_upstream() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(multipart_request(
            "file",
            Some("input.zip"),
            &prompt_archive("prompt.txt", "Hello", "secret"),
        ))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("input.txt not found"));
}

#[tokio::test]
async fn test_generate_empty_prompt() {
    let server = Server::new_async().await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(multipart_request(
            "file",
            Some("input.zip"),
            &prompt_archive("input.txt", "   \n\t ", "secret"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "Prompt is empty");
}

#[tokio::test]
async fn test_generate_upstream_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body(r#"{"error": {"message": "The server had an error"}}"#)
        .create_async()
        .await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(multipart_request(
            "file",
            Some("input.zip"),
            &prompt_archive("input.txt", "Hello", "secret"),
        ))
        .await
        .unwrap();

    assert!(response.status().is_server_error());
    let message = error_message(response).await;
    assert!(message.contains("500"));
    assert!(message.contains("The server had an error"));
    assert_scratch_empty(app.scratch.path());
}

#[tokio::test]
async fn test_generate_malformed_upstream_response() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices": [{"index": 0, "finish_reason": "stop"}]}"#)
        .create_async()
        .await;
    let app = build_app(&server, None);

    let response = app
        .router
        .oneshot(multipart_request(
            "file",
            Some("input.zip"),
            &prompt_archive("input.txt", "Hello", "secret"),
        ))
        .await
        .unwrap();

    assert!(response.status().is_server_error());
    assert!(error_message(response)
        .await
        .contains("choices[0].message.content"));
}

#[tokio::test]
async fn test_generate_upload_over_limit() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;
    let app = build_app(&server, Some("64"));

    let response = app
        .router
        .oneshot(multipart_request("file", Some("input.zip"), &[0u8; 4096]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
