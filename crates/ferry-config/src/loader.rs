//! Configuration loading from YAML files and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConfigDocument, FerryConfig};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "FERRY_CONFIG";
/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "configuration.yaml";

/// Resolve the configuration path from an optional environment value.
#[must_use]
pub fn config_path_from(value: Option<String>) -> PathBuf {
    value
        .filter(|path| !path.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load and validate the configuration referenced by [`CONFIG_PATH_ENV`].
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_from_env() -> ConfigResult<FerryConfig> {
    let path = config_path_from(std::env::var(CONFIG_PATH_ENV).ok());
    load_from_path(&path)
}

/// Load and validate the configuration stored at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_from_path(path: &Path) -> ConfigResult<FerryConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_document(path, &raw)?;
    info!(
        path = %path.display(),
        source_roots = config.layout.source_roots.len(),
        destination_root = %config.layout.destination_root.display(),
        "configuration loaded"
    );
    Ok(config)
}

/// Parse and validate a YAML document; `path` is only used for error context.
///
/// # Errors
///
/// Returns an error if the document is not valid YAML or fails validation.
pub fn parse_document(path: &Path, raw: &str) -> ConfigResult<FerryConfig> {
    let document: ConfigDocument =
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    FerryConfig::from_document(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_defaults_when_env_missing_or_blank() {
        assert_eq!(config_path_from(None), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(
            config_path_from(Some("   ".to_string())),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
        assert_eq!(
            config_path_from(Some("/etc/ferry.yaml".to_string())),
            PathBuf::from("/etc/ferry.yaml")
        );
    }

    #[test]
    fn parse_document_surfaces_yaml_errors() {
        let result = parse_document(Path::new("broken.yaml"), "srcDirs: [unterminated");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
