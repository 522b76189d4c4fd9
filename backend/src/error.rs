//! Error types and error handling for the HTTP layer
//!
//! This module defines the errors the service entry point can return.
//! All errors implement `IntoResponse` to provide consistent error formatting:
//! `{"error": <message>, "status": <code>}`.
//!
//! Oversized bodies and prompt entries map to 413 Payload Too Large.
//! Failures of the completion API map to 502 Bad Gateway.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::exchange::ExchangeError;

/// Application-level error types
///
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// The multipart form has no `file` field
    #[error("Missing file parameter")]
    MissingFile,

    /// The upload is present but unacceptable (e.g. wrong filename)
    #[error("{0}")]
    InvalidUpload(String),

    /// The multipart body could not be read
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// Error raised by the exchange pipeline
    #[error("{0}")]
    Exchange(#[from] ExchangeError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Exchange(e) => match e {
                ExchangeError::EntryTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                e if e.is_client_error() => StatusCode::BAD_REQUEST,
                ExchangeError::Upstream { .. }
                | ExchangeError::UpstreamUnreachable(_)
                | ExchangeError::MalformedUpstreamResponse(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
