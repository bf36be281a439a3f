//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::Request,
    middleware,
    routing::{get, post},
};
use ferry_fsops::TransferEngine;
use ferry_telemetry::{Metrics, build_sha};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::access::{AccessControl, require_allowed_peer};
use crate::http::assets::{index_service, metrics, not_found, static_service};
use crate::http::constants::{
    HEADER_REQUEST_ID, ROUTE_DATA, ROUTE_INDEX, ROUTE_METRICS, ROUTE_MOVE, STATIC_PREFIX,
};
use crate::http::telemetry::HttpMetricsLayer;
use crate::http::transfer::{data, move_items};
use crate::state::ApiState;

/// Axum router wrapper that hosts the ferry HTTP surface.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the router with every route behind the access-control gate.
    #[must_use]
    pub fn new(
        engine: TransferEngine,
        access: AccessControl,
        telemetry: Metrics,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        let state = Arc::new(ApiState::new(
            engine,
            access,
            telemetry.clone(),
            static_dir.into(),
        ));
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let method = request.method().clone();
                let uri_path = request.uri().path();
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                tracing::info_span!(
                    "http.request",
                    method = %method,
                    route = %uri_path,
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    let status = response.status().as_u16();
                    span.record("status_code", status);
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(ferry_telemetry::set_request_id_layer())
            .layer(ferry_telemetry::propagate_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));
        let access_gate = middleware::from_fn_with_state(state.clone(), require_allowed_peer);

        let router = Self::build_router(&state)
            .layer(access_gate)
            .layer(layered)
            .with_state(state);

        Self { router }
    }

    fn build_router(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
        Router::new()
            .route_service(ROUTE_INDEX, index_service(&state.static_dir))
            .route(ROUTE_DATA, get(data))
            .route(ROUTE_MOVE, post(move_items))
            .route(ROUTE_METRICS, get(metrics))
            .nest_service(STATIC_PREFIX, static_service(&state.static_dir))
            .fallback(not_found)
    }

    /// Serve on `addr` until `shutdown` resolves, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(addr = %addr, "starting ferry api");
        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|source| ApiServerError::Serve { source })
    }

    /// Consume the server and return the underlying router.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }
}
