//! Failures installing the subscriber or producing the Prometheus exposition.

use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed, or installing one failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A counter definition was rejected by Prometheus.
    #[error("failed to build metrics collector")]
    MetricsCollector {
        /// Metric name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// A counter could not be added to the registry.
    #[error("failed to register metrics collector")]
    MetricsRegister {
        /// Metric name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// The text exposition could not be encoded.
    #[error("failed to encode metrics")]
    MetricsEncode {
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// The text exposition was not valid UTF-8.
    #[error("metrics output was not valid utf-8")]
    MetricsUtf8 {
        /// Underlying UTF-8 conversion error.
        source: std::string::FromUtf8Error,
    },
}

impl TelemetryError {
    /// Metric the failure concerns, for collector and registry errors.
    #[must_use]
    pub const fn metric(&self) -> Option<&'static str> {
        match self {
            Self::MetricsCollector { name, .. } | Self::MetricsRegister { name, .. } => Some(*name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn registry_failures_name_the_metric() {
        let duplicate = TelemetryError::MetricsRegister {
            name: "transfers_total",
            source: prometheus::Error::AlreadyReg,
        };
        assert_eq!(duplicate.to_string(), "failed to register metrics collector");
        assert_eq!(duplicate.metric(), Some("transfers_total"));
        assert!(duplicate.source().is_some());

        let encode = TelemetryError::MetricsEncode {
            source: prometheus::Error::Msg("encode".to_string()),
        };
        assert_eq!(encode.metric(), None);
        assert_eq!(encode.to_string(), "failed to encode metrics");
    }

    #[test]
    fn invalid_utf8_exposition_keeps_cause() -> std::result::Result<(), Box<dyn Error>> {
        let Err(source) = String::from_utf8(vec![0, 159]) else {
            return Err("expected invalid utf-8".into());
        };
        let err = TelemetryError::MetricsUtf8 { source };
        assert_eq!(err.to_string(), "metrics output was not valid utf-8");
        assert!(err.source().is_some());
        Ok(())
    }
}
