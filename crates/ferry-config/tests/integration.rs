use std::fs;
use std::path::PathBuf;

use ferry_config::{ConfigError, LogFormatSetting, OwnershipTarget, load_from_path};

#[test]
fn load_from_path_reads_operator_document() -> anyhow::Result<()> {
    let dir = tempfile::Builder::new().prefix("ferry-config-").tempdir()?;
    let path = dir.path().join("configuration.yaml");
    fs::write(
        &path,
        r#"
srcDirs:
  - /srv/downloads/tv
  - /srv/downloads/movies
destRootDir: /srv/media
excludeDirs:
  - .stfolder
allowedCIDRs:
  - 192.168.1.0/24
  - 10.1.2.3
serverBindAddr: 0.0.0.0
serverBindPort: "8787"
chownUsrGrp: "1000:1000"
logFormat: json
requireRoot: false
"#,
    )?;

    let config = load_from_path(&path)?;
    assert_eq!(
        config.layout.source_roots,
        vec![
            PathBuf::from("/srv/downloads/movies"),
            PathBuf::from("/srv/downloads/tv"),
        ]
    );
    assert_eq!(config.layout.destination_root, PathBuf::from("/srv/media"));
    assert_eq!(config.layout.exclude_dirs, vec![".stfolder".to_string()]);
    assert_eq!(config.allowed_cidrs.len(), 2);
    assert_eq!(config.bind_addr(), "0.0.0.0:8787".parse()?);
    assert_eq!(
        config.ownership,
        OwnershipTarget {
            uid: 1000,
            gid: 1000
        }
    );
    assert_eq!(config.logging.format, Some(LogFormatSetting::Json));
    assert!(!config.require_root);
    Ok(())
}

#[test]
fn load_from_path_rejects_malformed_ownership() -> anyhow::Result<()> {
    let dir = tempfile::Builder::new().prefix("ferry-config-").tempdir()?;
    let path = dir.path().join("configuration.yaml");
    fs::write(
        &path,
        r"
srcDirs: [/srv/in]
destRootDir: /srv/out
allowedCIDRs: [127.0.0.1]
serverBindAddr: 127.0.0.1
serverBindPort: 8080
chownUsrGrp: media
",
    )?;

    let err = load_from_path(&path)
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected ownership rejection"))?;
    assert!(matches!(err, ConfigError::InvalidOwnership { .. }));
    Ok(())
}

#[test]
fn load_from_path_reports_missing_file() {
    let result = load_from_path(&PathBuf::from("/definitely/missing/ferry.yaml"));
    assert!(matches!(
        result,
        Err(ConfigError::Io {
            operation: "config.read",
            ..
        })
    ));
}
