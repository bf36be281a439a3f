//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes only the counters the transfer service reports on.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    transfers_total: IntCounterVec,
    listing_failures_total: IntCounterVec,
    access_denied_total: IntCounter,
}

/// Snapshot of selected counters for diagnostics and tests.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Transfers that completed, across operations.
    pub transfers_completed: u64,
    /// Transfers rejected by validation, across operations.
    pub transfers_rejected: u64,
    /// Transfers that failed during filesystem work, across operations.
    pub transfers_failed: u64,
    /// Requests refused by access control.
    pub access_denied_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "http_requests_total",
            source,
        })?;
        let transfers_total = IntCounterVec::new(
            Opts::new("transfers_total", "Transfer attempts by operation and status"),
            &["operation", "status"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "transfers_total",
            source,
        })?;
        let listing_failures_total = IntCounterVec::new(
            Opts::new(
                "listing_failures_total",
                "Directory listings that could not be read",
            ),
            &["target"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "listing_failures_total",
            source,
        })?;
        let access_denied_total = IntCounter::with_opts(Opts::new(
            "access_denied_total",
            "Requests rejected by the address allow-list",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "access_denied_total",
            source,
        })?;

        Self::register(&registry, "http_requests_total", &http_requests_total)?;
        Self::register(&registry, "transfers_total", &transfers_total)?;
        Self::register(&registry, "listing_failures_total", &listing_failures_total)?;
        Self::register(&registry, "access_denied_total", &access_denied_total)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                transfers_total,
                listing_failures_total,
                access_denied_total,
            }),
        })
    }

    fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
    where
        C: prometheus::core::Collector + Clone + 'static,
    {
        registry
            .register(Box::new(collector.clone()))
            .map_err(|source| TelemetryError::MetricsRegister { name, source })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Increment the transfer counter for an operation (`move`, `copy`) and status.
    pub fn inc_transfer(&self, operation: &str, status: &str) {
        self.inner
            .transfers_total
            .with_label_values(&[operation, status])
            .inc();
    }

    /// Record a listing that could not be read (`source` or `destination`).
    pub fn inc_listing_failure(&self, target: &str) {
        self.inner
            .listing_failures_total
            .with_label_values(&[target])
            .inc();
    }

    /// Increment the counter of requests refused by access control.
    pub fn inc_access_denied(&self) {
        self.inner.access_denied_total.inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the transfer and access counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            transfers_completed: self.transfer_total_for("completed"),
            transfers_rejected: self.transfer_total_for("rejected"),
            transfers_failed: self.transfer_total_for("failed"),
            access_denied_total: self.inner.access_denied_total.get(),
        }
    }

    fn transfer_total_for(&self, status: &str) -> u64 {
        ["move", "copy"]
            .iter()
            .map(|operation| {
                self.inner
                    .transfers_total
                    .with_label_values(&[operation, status])
                    .get()
            })
            .sum()
    }
}
