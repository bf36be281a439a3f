//! Browser UI assets and the Prometheus scrape endpoint.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use tower_http::services::{ServeDir, ServeFile};
use tracing::error;

use crate::http::constants::INDEX_FILE;
use crate::http::errors::ApiError;
use crate::state::ApiState;

/// Service answering `/` with the UI entry page.
pub(crate) fn index_service(static_dir: &Path) -> ServeFile {
    ServeFile::new(static_dir.join(INDEX_FILE))
}

/// Service answering `/static/*` from the asset directory; missing files yield 404.
pub(crate) fn static_service(static_dir: &Path) -> ServeDir {
    ServeDir::new(static_dir)
}

/// `GET /metrics`: Prometheus text exposition.
pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.telemetry.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal("failed to build metrics response")
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal("failed to render metrics"))
        }
    }
}

/// Fallback for paths no route matches.
pub(crate) async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
