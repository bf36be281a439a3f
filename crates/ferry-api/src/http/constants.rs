//! Shared HTTP constants (headers, routes, problem URIs).

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const ROUTE_INDEX: &str = "/";
pub(crate) const ROUTE_DATA: &str = "/data";
pub(crate) const ROUTE_MOVE: &str = "/move";
pub(crate) const ROUTE_METRICS: &str = "/metrics";
pub(crate) const STATIC_PREFIX: &str = "/static";
pub(crate) const INDEX_FILE: &str = "index.html";

pub(crate) const FORBIDDEN_BODY: &str = "Forbidden";

pub(crate) const PROBLEM_INTERNAL: &str = "/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "/problems/bad-request";
