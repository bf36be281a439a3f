//! Request types accepted by the transfer engine.

use std::fmt;

/// Which filesystem operation a transfer performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Rename the item into the destination.
    Move,
    /// Duplicate the item's subtree into the destination.
    Copy,
}

impl TransferKind {
    /// Label used in logs, metrics, and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item to transfer out of a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Source root exactly as listed by the directory index.
    pub source_root: String,
    /// Name of a direct child of the source root.
    pub item: String,
    /// Name of a direct child directory of the destination root.
    pub destination: String,
}

impl TransferRequest {
    /// Build a request from its three parts.
    #[must_use]
    pub fn new(
        source_root: impl Into<String>,
        item: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            item: item.into(),
            destination: destination.into(),
        }
    }
}
