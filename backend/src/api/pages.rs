//! Liveness, health and upload form

use axum::{response::Html, Json};
use serde::Serialize;

#[allow(missing_docs)]
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub message: String,
}

/// GET / - plain-text liveness check
pub async fn index() -> &'static str {
    "✅ OpenAI ZIP API is running!"
}

/// GET /api/health - JSON health check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "zipgpt backend is healthy".to_string(),
    })
}

const UPLOAD_FORM: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>zipgpt upload</title>
</head>
<body>
  <h1>Upload encrypted prompt</h1>
  <p>Select a password-protected <code>input.zip</code> containing <code>input.txt</code>.</p>
  <form action="/generate" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".zip" required>
    <button type="submit">Generate</button>
  </form>
</body>
</html>
"#;

/// GET /upload - human upload form
pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}
