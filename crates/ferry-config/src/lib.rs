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

//! File-backed configuration for the ferry service.
//!
//! Layout: `model.rs` (raw document and validated models), `validate.rs`
//! (document validation), `loader.rs` (file and environment loading).

pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, config_path_from, load_from_env, load_from_path,
    parse_document,
};
pub use model::{
    ConfigDocument, FerryConfig, FsLayout, LogFormatSetting, LoggingSettings, OwnershipTarget,
    PortSpec, ServerConfig,
};
pub use validate::parse_ownership;
