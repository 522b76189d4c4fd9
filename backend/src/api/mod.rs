//! API module
//!
//! Contains the HTTP request handlers and the router for service mode.

pub mod generate;
pub mod middleware;
pub mod pages;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::exchange::ExchangeHandler;

/// Shared router state
pub type RouterState = Arc<ExchangeHandler>;

/// Build the application router
pub fn router(handler: RouterState) -> Router {
    let max_upload_bytes = handler.config().server.max_upload_bytes;

    Router::new()
        // Liveness and presentation
        .route("/", get(pages::index))
        .route("/upload", get(pages::upload_form))
        .route("/api/health", get(pages::health_check))
        // Exchange
        .route(
            "/generate",
            post(generate::generate).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(handler)
}
