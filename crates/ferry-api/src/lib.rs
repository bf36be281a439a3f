#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! HTTP surface for ferry: listing, batch move, static UI, and metrics,
//! all gated by an address allow-list.

pub mod error;
pub mod http;
pub mod models;
pub(crate) mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::access::{AccessControl, AccessError};
pub use http::router::ApiServer;
pub use models::{DataResponse, MoveRequest, OperationResult, ProblemDetails};
