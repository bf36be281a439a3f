//! HTTP surface modules (routers, handlers, middleware).

/// Address allow-list and the middleware enforcing it.
pub mod access;
/// Index page, static assets, and metrics endpoints.
pub(crate) mod assets;
/// Shared constants and header names for HTTP surfaces.
pub(crate) mod constants;
/// Problem response helpers and error types.
pub(crate) mod errors;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub(crate) mod telemetry;
/// Listing and move handlers.
pub(crate) mod transfer;
