//! Scratch directory trees mirroring a small deployment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ferry_config::{FsLayout, OwnershipTarget};
use nix::unistd::{getegid, geteuid};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Names of the source roots created under the scratch directory.
pub const SOURCE_NAMES: [&str; 3] = ["src1", "src2", "src3"];
/// Destination subdirectories created under the destination root.
pub const LAND_NAMES: [&str; 3] = ["land1", "land2", "land3"];
/// Directory names listed as excluded.
pub const EXCLUDE_NAMES: [&str; 2] = ["exclude1", "exclude2"];
/// Top-level directories placed in every source root.
pub const DIR_NAMES: [&str; 2] = ["dir1", "dir2"];
/// Files placed at the top of every source root and in every leaf directory.
pub const FILE_NAMES: [&str; 2] = ["file1", "file2"];

/// Temporary tree of three source roots and one destination root.
///
/// Every source root holds `dir1` and `dir2` (each with `subdir1` and
/// `subdir2` containing `file1` and `file2`), the files `file1` and `file2`,
/// and the excluded directories `exclude1` and `exclude2`. The destination
/// root holds `land1`, `land2`, `land3` and the excluded directories.
pub struct MockTree {
    root: TempDir,
    source_roots: Vec<PathBuf>,
    destination_root: PathBuf,
}

impl MockTree {
    /// Build the tree in a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory or file cannot be created.
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("ferry-mock-tree-")
            .tempdir()
            .context("failed to create scratch directory")?;

        let mut source_roots = Vec::with_capacity(SOURCE_NAMES.len());
        for name in SOURCE_NAMES {
            let source = root.path().join(name);
            populate_source(&source)?;
            source_roots.push(source);
        }

        let destination_root = root.path().join("dest");
        for name in LAND_NAMES.iter().chain(EXCLUDE_NAMES.iter()) {
            let dir = destination_root.join(name);
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        Ok(Self {
            root,
            source_roots,
            destination_root,
        })
    }

    /// Scratch directory holding the whole tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Source roots in ascending order.
    #[must_use]
    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    /// Source root at `index` (0..3).
    #[must_use]
    pub fn source(&self, index: usize) -> &Path {
        &self.source_roots[index]
    }

    /// Destination root.
    #[must_use]
    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Destination subdirectory by name.
    #[must_use]
    pub fn land(&self, name: &str) -> PathBuf {
        self.destination_root.join(name)
    }

    /// Layout pointing at this tree with the standard exclusion list.
    #[must_use]
    pub fn layout(&self) -> FsLayout {
        FsLayout {
            source_roots: self.source_roots.clone(),
            destination_root: self.destination_root.clone(),
            exclude_dirs: EXCLUDE_NAMES.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create an empty file directly under a source root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn add_source_file(&self, index: usize, name: &str) -> Result<PathBuf> {
        let path = self.source(index).join(name);
        fs::write(&path, b"")
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(path)
    }
}

/// Ownership matching the current process, usable without privileges.
#[must_use]
pub fn current_ownership() -> OwnershipTarget {
    OwnershipTarget {
        uid: geteuid().as_raw(),
        gid: getegid().as_raw(),
    }
}

/// Relative paths of every entry below `root`, sorted. Symlinks are listed, not followed.
///
/// # Errors
///
/// Returns an error if any directory cannot be read.
pub fn relative_entries(root: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        entries.push(entry.path().strip_prefix(root)?.to_path_buf());
    }
    entries.sort();
    Ok(entries)
}

fn populate_source(source: &Path) -> Result<()> {
    for dir in DIR_NAMES {
        for sub in DIR_NAMES {
            let leaf = source.join(dir).join(format!("sub{sub}"));
            fs::create_dir_all(&leaf)
                .with_context(|| format!("failed to create {}", leaf.display()))?;
            for file in FILE_NAMES {
                fs::write(leaf.join(file), file.as_bytes())?;
            }
        }
    }
    for file in FILE_NAMES {
        fs::write(source.join(file), file.as_bytes())?;
    }
    for exclude in EXCLUDE_NAMES {
        fs::create_dir_all(source.join(exclude))?;
    }
    Ok(())
}
