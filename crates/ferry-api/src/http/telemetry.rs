//! HTTP metrics middleware for request counting.
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use axum::extract::MatchedPath;
use axum::http::Request;
use ferry_telemetry::{Metrics, with_request_context};
use tower::{Layer, Service};

use crate::http::constants::{
    HEADER_REQUEST_ID, ROUTE_DATA, ROUTE_INDEX, ROUTE_METRICS, ROUTE_MOVE, STATIC_PREFIX,
};

/// Wraps HTTP services to record request metrics per route and status code.
#[derive(Clone)]
pub(crate) struct HttpMetricsLayer {
    telemetry: Metrics,
}

impl HttpMetricsLayer {
    /// Construct a new metrics layer with the shared telemetry handle.
    pub(crate) const fn new(telemetry: Metrics) -> Self {
        Self { telemetry }
    }
}

impl<S> Layer<S> for HttpMetricsLayer {
    type Service = HttpMetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpMetricsService {
            inner,
            telemetry: self.telemetry.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct HttpMetricsService<S> {
    inner: S,
    telemetry: Metrics,
}

impl<S, B> Service<Request<B>> for HttpMetricsService<S>
where
    S: Service<Request<B>, Response = axum::response::Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let route = req.extensions().get::<MatchedPath>().map_or_else(
            || route_label(req.uri().path()).to_string(),
            |matched| matched.as_str().to_string(),
        );
        let request_id = req
            .headers()
            .get(HEADER_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let telemetry = self.telemetry.clone();
        let fut = self.inner.call(req);

        Box::pin(async move {
            with_request_context(request_id, route.clone(), async move {
                let response = fut.await?;
                telemetry.inc_http_request(&route, response.status().as_u16());
                Ok(response)
            })
            .await
        })
    }
}

/// Collapse request paths onto a bounded set of metric labels.
pub(crate) fn route_label(path: &str) -> &'static str {
    match path {
        ROUTE_INDEX => ROUTE_INDEX,
        ROUTE_DATA => ROUTE_DATA,
        ROUTE_MOVE => ROUTE_MOVE,
        ROUTE_METRICS => ROUTE_METRICS,
        _ if path.starts_with(STATIC_PREFIX) => "/static/*",
        _ => "unmatched",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::response::Response;
    use ferry_telemetry::{current_request_id, current_route};
    use std::convert::Infallible;
    use tower::ServiceExt;

    #[tokio::test]
    async fn handlers_run_inside_request_context() -> anyhow::Result<()> {
        let inner = tower::service_fn(|_req: Request<Body>| async move {
            let request_id = current_request_id().unwrap_or_default();
            let route = current_route().unwrap_or_default();
            Ok::<_, Infallible>(Response::new(Body::from(format!("{request_id} {route}"))))
        });
        let service = HttpMetricsLayer::new(Metrics::new()?).layer(inner);
        let request = Request::builder()
            .uri("/move")
            .header(HEADER_REQUEST_ID, "req-7")
            .body(Body::empty())?;

        let response = service.oneshot(request).await?;
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"req-7 /move");
        Ok(())
    }

    #[test]
    fn route_label_bounds_cardinality() {
        assert_eq!(route_label("/data"), "/data");
        assert_eq!(route_label("/static/js/app.js"), "/static/*");
        assert_eq!(route_label("/etc/passwd"), "unmatched");
    }
}
