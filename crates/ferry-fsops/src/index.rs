//! Sorted, exclusion-aware listings of the source and destination roots.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ferry_config::FsLayout;

use crate::error::{FsOpsError, FsOpsResult};

/// Entries of every source root, keyed by root, each list sorted ascending.
pub type SourceListing = BTreeMap<PathBuf, Vec<String>>;

/// Read-only view over the configured roots.
///
/// Clones share the same exclusion set, so the transfer engine validates
/// against exactly what the API lists.
#[derive(Debug, Clone)]
pub struct DirectoryIndex {
    inner: Arc<IndexInner>,
}

#[derive(Debug)]
struct IndexInner {
    source_roots: Vec<PathBuf>,
    destination_root: PathBuf,
    exclude_dirs: BTreeSet<String>,
}

impl DirectoryIndex {
    /// Build an index over the given layout.
    #[must_use]
    pub fn new(layout: &FsLayout) -> Self {
        let mut source_roots = layout.source_roots.clone();
        source_roots.sort();
        source_roots.dedup();
        Self {
            inner: Arc::new(IndexInner {
                source_roots,
                destination_root: layout.destination_root.clone(),
                exclude_dirs: layout.exclude_dirs.iter().cloned().collect(),
            }),
        }
    }

    /// Configured source roots, ascending.
    #[must_use]
    pub fn source_roots(&self) -> &[PathBuf] {
        &self.inner.source_roots
    }

    /// Configured destination root.
    #[must_use]
    pub fn destination_root(&self) -> &Path {
        &self.inner.destination_root
    }

    /// Whether a directory with this name is hidden.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.inner.exclude_dirs.contains(name)
    }

    /// List the direct children of every source root.
    ///
    /// Directories whose name is excluded are omitted; files are always kept.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any root cannot be read.
    pub fn source_contents(&self) -> FsOpsResult<SourceListing> {
        let mut listing = SourceListing::new();
        for root in &self.inner.source_roots {
            let names = self.read_names(root, "index.read_source", false)?;
            listing.insert(root.clone(), names);
        }
        Ok(listing)
    }

    /// List the direct child directories of the destination root, minus excluded names.
    ///
    /// # Errors
    ///
    /// Fails if the destination root cannot be read.
    pub fn destination_dirs(&self) -> FsOpsResult<Vec<String>> {
        self.read_names(&self.inner.destination_root, "index.read_destination", true)
    }

    fn read_names(
        &self,
        dir: &Path,
        operation: &'static str,
        dirs_only: bool,
    ) -> FsOpsResult<Vec<String>> {
        let entries = fs::read_dir(dir).map_err(|source| FsOpsError::io(operation, dir, source))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| FsOpsError::io(operation, dir, source))?;
            // Symlinks are classified as themselves, never as their target.
            let file_type = entry
                .file_type()
                .map_err(|source| FsOpsError::io(operation, entry.path(), source))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if file_type.is_dir() {
                if self.is_excluded(&name) {
                    continue;
                }
            } else if dirs_only {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }
}
