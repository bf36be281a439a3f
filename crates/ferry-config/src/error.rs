//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Required field was absent or empty.
    #[error("missing configuration field")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// Ownership specifier did not match `<uid>:<gid>`.
    #[error("invalid ownership specifier")]
    InvalidOwnership {
        /// Raw specifier supplied by the operator.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Bind address value was invalid.
    #[error("invalid bind address")]
    InvalidBindAddr {
        /// Bind address payload provided by the operator.
        value: String,
    },
    /// Bind port value was invalid.
    #[error("invalid bind port")]
    InvalidBindPort {
        /// Port payload provided by the operator.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The YAML document could not be parsed.
    #[error("failed to parse configuration document")]
    Parse {
        /// Path of the document being parsed.
        path: PathBuf,
        /// Source YAML error.
        source: serde_yaml::Error,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_messages_are_constant() {
        let err = ConfigError::InvalidOwnership {
            value: "root:wheel".to_string(),
            reason: "uid_not_numeric",
        };
        assert_eq!(err.to_string(), "invalid ownership specifier");
        assert!(err.source().is_none());

        let io_err = ConfigError::Io {
            operation: "config.read",
            path: PathBuf::from("configuration.yaml"),
            source: io::Error::other("io"),
        };
        assert_eq!(io_err.to_string(), "filesystem operation failed");
        assert!(io_err.source().is_some());
    }
}
