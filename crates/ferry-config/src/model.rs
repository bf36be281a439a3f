//! Typed configuration models.
//!
//! # Design
//! - `ConfigDocument` mirrors the YAML file one-to-one and is never used at runtime.
//! - `FerryConfig` is the validated, immutable value handed to every component.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::Deserialize;

/// Default location of the static UI assets.
pub const DEFAULT_STATIC_DIR: &str = "static";
/// Default log level when neither `RUST_LOG` nor `logLevel` is supplied.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Raw configuration document as written by operators.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Directories items may be moved out of.
    #[serde(default)]
    pub src_dirs: Vec<String>,
    /// Root directory whose direct children are the valid destinations.
    #[serde(default)]
    pub dest_root_dir: String,
    /// Directory names hidden from listings and validation.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Individual IPs or CIDR blocks admitted by access control.
    #[serde(default, rename = "allowedCIDRs")]
    pub allowed_cidrs: Vec<String>,
    /// IP address the HTTP listener binds to.
    #[serde(default)]
    pub server_bind_addr: String,
    /// Port the HTTP listener binds to.
    #[serde(default)]
    pub server_bind_port: Option<PortSpec>,
    /// Ownership applied to transferred entries, formatted `<uid>:<gid>`.
    #[serde(default)]
    pub chown_usr_grp: String,
    /// Directory serving `index.html` and `/static/*` assets.
    #[serde(default)]
    pub static_dir: Option<String>,
    /// Log level (`info`, `debug`, ...).
    #[serde(default)]
    pub log_level: Option<String>,
    /// Log output format (`json` or `pretty`).
    #[serde(default)]
    pub log_format: Option<String>,
    /// Refuse to start unless running with an effective uid of 0.
    #[serde(default)]
    pub require_root: Option<bool>,
}

/// Port values are accepted either quoted or as bare integers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    /// Bare YAML integer.
    Number(i64),
    /// Quoted YAML string.
    Text(String),
}

/// Owner and group applied to every entry touched by a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipTarget {
    /// Numeric user identifier.
    pub uid: u32,
    /// Numeric group identifier.
    pub gid: u32,
}

/// Filesystem roots and the exclusion list shared by listing and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsLayout {
    /// Source roots, sorted ascending and deduplicated.
    pub source_roots: Vec<PathBuf>,
    /// Destination root; every write target is a direct child of it.
    pub destination_root: PathBuf,
    /// Directory names hidden from enumeration on both sides.
    pub exclude_dirs: Vec<String>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address and port the listener binds to.
    pub bind: SocketAddr,
    /// Directory serving the browser UI.
    pub static_dir: PathBuf,
}

/// Output format requested for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging settings resolved from the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Level passed to the env filter when `RUST_LOG` is unset.
    pub level: String,
    /// Explicit format; `None` lets telemetry infer one from the build profile.
    pub format: Option<LogFormatSetting>,
}

/// Validated, immutable runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FerryConfig {
    /// Directory layout the engine operates on.
    pub layout: FsLayout,
    /// Raw allow-list entries; parsed by access control.
    pub allowed_cidrs: Vec<String>,
    /// Listener settings.
    pub server: ServerConfig,
    /// Ownership applied after every transfer.
    pub ownership: OwnershipTarget,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Whether startup requires an effective uid of 0.
    pub require_root: bool,
}

impl FerryConfig {
    /// Address the HTTP listener should bind.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.server.bind
    }

    /// Bind IP without the port.
    #[must_use]
    pub const fn bind_ip(&self) -> IpAddr {
        self.server.bind.ip()
    }
}
