//! Validation helpers turning a `ConfigDocument` into a `FerryConfig`.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    ConfigDocument, DEFAULT_LOG_LEVEL, DEFAULT_STATIC_DIR, FerryConfig, FsLayout, LogFormatSetting,
    LoggingSettings, OwnershipTarget, PortSpec, ServerConfig,
};

impl FerryConfig {
    /// Validate a parsed document and build the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first field that failed validation.
    pub fn from_document(document: ConfigDocument) -> ConfigResult<Self> {
        let layout = parse_layout(&document)?;
        let ownership = parse_ownership(&document.chown_usr_grp)?;
        let ip = parse_bind_addr(&document.server_bind_addr)?;
        let port = parse_bind_port(document.server_bind_port.as_ref())?;
        let logging = parse_logging(document.log_level, document.log_format)?;
        let static_dir = document
            .static_dir
            .filter(|dir| !dir.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string());

        Ok(Self {
            layout,
            allowed_cidrs: document.allowed_cidrs,
            server: ServerConfig {
                bind: SocketAddr::new(ip, port),
                static_dir: PathBuf::from(static_dir),
            },
            ownership,
            logging,
            require_root: document.require_root.unwrap_or(true),
        })
    }
}

fn parse_layout(document: &ConfigDocument) -> ConfigResult<FsLayout> {
    if document.src_dirs.is_empty() {
        return Err(ConfigError::MissingField { field: "srcDirs" });
    }

    let mut source_roots = Vec::with_capacity(document.src_dirs.len());
    for entry in &document.src_dirs {
        source_roots.push(parse_absolute_dir("srcDirs", entry)?);
    }
    source_roots.sort();
    source_roots.dedup();

    if document.dest_root_dir.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: "destRootDir",
        });
    }
    let destination_root = parse_absolute_dir("destRootDir", &document.dest_root_dir)?;

    let mut exclude_dirs: Vec<String> = document
        .exclude_dirs
        .iter()
        .filter(|name| !name.is_empty())
        .cloned()
        .collect();
    exclude_dirs.sort();
    exclude_dirs.dedup();

    Ok(FsLayout {
        source_roots,
        destination_root,
        exclude_dirs,
    })
}

fn parse_absolute_dir(field: &'static str, value: &str) -> ConfigResult<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidField {
            field,
            value: Some(value.to_string()),
            reason: "empty",
        });
    }
    let path = PathBuf::from(trimmed);
    if !path.is_absolute() {
        return Err(ConfigError::InvalidField {
            field,
            value: Some(value.to_string()),
            reason: "not_absolute",
        });
    }
    Ok(path)
}

/// Parse a `<uid>:<gid>` ownership specifier.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOwnership`] when the value does not contain exactly
/// two numeric components.
pub fn parse_ownership(value: &str) -> ConfigResult<OwnershipTarget> {
    let mut parts = value.split(':');
    let (Some(uid), Some(gid), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ConfigError::InvalidOwnership {
            value: value.to_string(),
            reason: "expected_uid_colon_gid",
        });
    };
    let uid = uid
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidOwnership {
            value: value.to_string(),
            reason: "uid_not_numeric",
        })?;
    let gid = gid
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidOwnership {
            value: value.to_string(),
            reason: "gid_not_numeric",
        })?;
    Ok(OwnershipTarget { uid, gid })
}

fn parse_bind_addr(value: &str) -> ConfigResult<IpAddr> {
    value
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| ConfigError::InvalidBindAddr {
            value: value.to_string(),
        })
}

fn parse_bind_port(value: Option<&PortSpec>) -> ConfigResult<u16> {
    let raw = match value {
        None => {
            return Err(ConfigError::MissingField {
                field: "serverBindPort",
            });
        }
        Some(PortSpec::Number(number)) => *number,
        Some(PortSpec::Text(text)) => {
            text.trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidBindPort {
                    value: text.clone(),
                    reason: "not_numeric",
                })?
        }
    };
    if !(1..=65_535).contains(&raw) {
        return Err(ConfigError::InvalidBindPort {
            value: raw.to_string(),
            reason: "out_of_range",
        });
    }
    u16::try_from(raw).map_err(|_| ConfigError::InvalidBindPort {
        value: raw.to_string(),
        reason: "out_of_range",
    })
}

fn parse_logging(level: Option<String>, format: Option<String>) -> ConfigResult<LoggingSettings> {
    let level = level
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let format = match format.as_deref().map(str::trim) {
        None | Some("") => None,
        Some("json") => Some(LogFormatSetting::Json),
        Some("pretty") => Some(LogFormatSetting::Pretty),
        Some(other) => {
            warn!(log_format = other, "unsupported log format requested");
            return Err(ConfigError::InvalidField {
                field: "logFormat",
                value: Some(other.to_string()),
                reason: "unsupported",
            });
        }
    };
    Ok(LoggingSettings { level, format })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn document() -> ConfigDocument {
        ConfigDocument {
            src_dirs: vec!["/srv/b".to_string(), "/srv/a".to_string(), "/srv/b".to_string()],
            dest_root_dir: "/library".to_string(),
            exclude_dirs: vec!["lost+found".to_string(), ".snapshots".to_string()],
            allowed_cidrs: vec!["10.0.0.0/8".to_string()],
            server_bind_addr: "127.0.0.1".to_string(),
            server_bind_port: Some(PortSpec::Text("8080".to_string())),
            chown_usr_grp: "127:128".to_string(),
            ..ConfigDocument::default()
        }
    }

    #[test]
    fn from_document_sorts_and_deduplicates_roots() -> Result<()> {
        let config = FerryConfig::from_document(document())?;
        assert_eq!(
            config.layout.source_roots,
            vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")]
        );
        assert_eq!(config.layout.exclude_dirs, vec![".snapshots", "lost+found"]);
        assert_eq!(config.ownership, OwnershipTarget { uid: 127, gid: 128 });
        assert_eq!(config.bind_addr(), "127.0.0.1:8080".parse()?);
        assert_eq!(config.server.static_dir, PathBuf::from(DEFAULT_STATIC_DIR));
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
        assert!(config.require_root);
        Ok(())
    }

    #[test]
    fn parse_ownership_rejects_malformed_specifiers() {
        for value in ["", "127", "127:", ":127", "a:1", "1:b", "1:2:3", "-1:5"] {
            assert!(
                matches!(
                    parse_ownership(value),
                    Err(ConfigError::InvalidOwnership { .. })
                ),
                "expected {value:?} to be rejected"
            );
        }
    }

    #[test]
    fn parse_ownership_accepts_numeric_pair() -> Result<()> {
        assert_eq!(parse_ownership("0:0")?, OwnershipTarget { uid: 0, gid: 0 });
        assert_eq!(
            parse_ownership("1000:100")?,
            OwnershipTarget {
                uid: 1000,
                gid: 100
            }
        );
        Ok(())
    }

    #[test]
    fn bind_port_validation_enforces_range() {
        assert!(parse_bind_port(Some(&PortSpec::Number(0))).is_err());
        assert!(parse_bind_port(Some(&PortSpec::Number(65_536))).is_err());
        assert!(parse_bind_port(Some(&PortSpec::Text("http".to_string()))).is_err());
        assert!(matches!(
            parse_bind_port(None),
            Err(ConfigError::MissingField {
                field: "serverBindPort"
            })
        ));
        assert!(matches!(
            parse_bind_port(Some(&PortSpec::Number(443))),
            Ok(443)
        ));
    }

    #[test]
    fn from_document_rejects_relative_roots() {
        let mut doc = document();
        doc.src_dirs = vec!["relative/path".to_string()];
        assert!(matches!(
            FerryConfig::from_document(doc),
            Err(ConfigError::InvalidField {
                field: "srcDirs",
                reason: "not_absolute",
                ..
            })
        ));
    }

    #[test]
    fn from_document_requires_sources_and_destination() {
        let mut doc = document();
        doc.src_dirs.clear();
        assert!(matches!(
            FerryConfig::from_document(doc),
            Err(ConfigError::MissingField { field: "srcDirs" })
        ));

        let mut doc = document();
        doc.dest_root_dir = "  ".to_string();
        assert!(matches!(
            FerryConfig::from_document(doc),
            Err(ConfigError::MissingField {
                field: "destRootDir"
            })
        ));
    }

    #[test]
    fn from_document_rejects_bad_bind_addr_and_log_format() {
        let mut doc = document();
        doc.server_bind_addr = "localhost".to_string();
        assert!(matches!(
            FerryConfig::from_document(doc),
            Err(ConfigError::InvalidBindAddr { .. })
        ));

        let mut doc = document();
        doc.log_format = Some("xml".to_string());
        assert!(matches!(
            FerryConfig::from_document(doc),
            Err(ConfigError::InvalidField {
                field: "logFormat",
                ..
            })
        ));
    }
}
