//! # Design
//!
//! - Provide structured, constant-message errors for listing and transfers.
//! - Capture operation context (operation, path) in fields, not in messages.
//! - Keep validation rejections apart from filesystem failures so callers can tell them apart.

use std::error::Error as _;
use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Reasons a transfer request is refused before touching the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The request named no source root.
    #[error("source directory was not provided")]
    MissingSource,
    /// The request named no item.
    #[error("file/dir to move|copy was not provided")]
    MissingItem,
    /// The request named no destination subdirectory.
    #[error("destination directory was not provided")]
    MissingDestination,
    /// The destination resolves to the source root itself.
    #[error("src and dest directories cannot be the same")]
    SameDirectory,
    /// The source root is not a configured, readable root.
    #[error("source directory not accessible")]
    UnknownSource,
    /// The item is not listed under the source root.
    #[error("item not found in source directory")]
    ItemNotFound,
    /// The destination subdirectory is not listed under the destination root.
    #[error("destination directory not accessible")]
    UnknownDestination,
}

/// Errors produced by listing and transfer operations.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// The request failed validation; nothing was changed.
    #[error(transparent)]
    Rejected(#[from] Rejection),
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Walkdir traversal failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Nix syscall failures.
    #[error("fsops nix failure")]
    Nix {
        /// Operation that triggered the nix failure.
        operation: &'static str,
        /// Path involved in the nix failure.
        path: PathBuf,
        /// Underlying nix error.
        source: nix::Error,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Returns the validation rejection, if this error is one.
    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }

    /// Human-readable description including the operation, path, and source chain.
    ///
    /// This is the text reported back to operators for a failed item.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        match self {
            Self::Rejected(_) => return message,
            Self::Io {
                operation, path, ..
            }
            | Self::Walkdir {
                operation, path, ..
            }
            | Self::Nix {
                operation, path, ..
            } => {
                let _ = write!(message, ": {operation} {}", path.display());
            }
        }
        let mut source = self.source();
        while let Some(cause) = source {
            let _ = write!(message, ": {cause}");
            source = cause.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn rejection_converts_and_keeps_message() {
        let err = FsOpsError::from(Rejection::ItemNotFound);
        assert_eq!(err.rejection(), Some(Rejection::ItemNotFound));
        assert_eq!(err.to_string(), "item not found in source directory");
        assert_eq!(err.describe(), "item not found in source directory");
    }

    #[test]
    fn describe_includes_operation_path_and_source() {
        let err = FsOpsError::io(
            "transfer.rename",
            "/srv/src/item",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.source().is_some());
        assert_eq!(err.rejection(), None);
        assert_eq!(
            err.describe(),
            "fsops io failure: transfer.rename /srv/src/item: denied"
        );
    }

    #[test]
    fn walkdir_helper_builds_variant() -> anyhow::Result<()> {
        let temp = tempfile::Builder::new().prefix("ferry-fsops-").tempdir()?;
        let missing = temp.path().join("missing");
        let walk_error = walkdir::WalkDir::new(&missing)
            .into_iter()
            .next()
            .and_then(Result::err)
            .ok_or_else(|| anyhow::anyhow!("expected walkdir error"))?;
        let err = FsOpsError::walkdir("ownership.walk", &missing, walk_error);
        assert!(matches!(err, FsOpsError::Walkdir { .. }));
        assert!(err.describe().starts_with("fsops walkdir failure: ownership.walk"));
        Ok(())
    }
}
