// src/api.rs
//! Local preview server: the generated site plus health and metrics endpoints.
//! Read-only; publishing never depends on it.

use std::path::Path;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::metrics::Metrics;

/// `/health`, optional `/metrics`, and everything else served from `site_dir`
/// (`/` resolves to `index.html`).
pub fn router(site_dir: &Path, metrics: Option<&Metrics>) -> Router {
    let mut app = Router::new().route("/health", get(|| async { "ok" }));
    if let Some(m) = metrics {
        app = app.merge(m.router());
    }
    app.fallback_service(ServeDir::new(site_dir).append_index_html_on_directories(true))
        .layer(CorsLayer::very_permissive())
}
