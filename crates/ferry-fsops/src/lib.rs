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

//! Directory listings and serialized transfers between the configured roots.
//!
//! Layout: `index.rs` (sorted, exclusion-aware listings), `service.rs`
//! (validated move/copy plus ownership rewrite), `model.rs` (request types),
//! `error.rs` (rejections and filesystem failures).

pub mod error;
pub mod index;
pub mod model;
pub mod service;

pub use error::{FsOpsError, FsOpsResult, Rejection};
pub use index::{DirectoryIndex, SourceListing};
pub use model::{TransferKind, TransferRequest};
pub use service::TransferEngine;
