//! Listener errors for the ferry HTTP surface.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for API server operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Failures while binding or running the HTTP listener.
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// The listen address could not be bound.
    #[error("failed to bind api listener")]
    Bind {
        /// Address from `serverBindAddr` and `serverBindPort`.
        addr: SocketAddr,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The accept loop stopped with an error.
    #[error("api server terminated unexpectedly")]
    Serve {
        /// Underlying IO error.
        source: io::Error,
    },
}

impl ApiServerError {
    /// Address the listener was meant to bind, when the failure concerns one.
    #[must_use]
    pub const fn addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Bind { addr, .. } => Some(*addr),
            Self::Serve { .. } => None,
        }
    }
}
