//! Serialized move/copy of single items followed by an ownership rewrite.

use std::fs;
use std::io;
use std::os::unix::fs::{PermissionsExt, lchown};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use ferry_config::OwnershipTarget;
use ferry_telemetry::Metrics;
use nix::unistd::{Gid, Uid, chown};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult, Rejection};
use crate::index::DirectoryIndex;
use crate::model::{TransferKind, TransferRequest};

/// Executes validated transfers one at a time.
///
/// Every transfer holds a single engine-wide lock from validation through the
/// ownership rewrite, so no two transfers interleave. Listings taken directly
/// from the [`DirectoryIndex`] do not take the lock.
#[derive(Clone)]
pub struct TransferEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    index: DirectoryIndex,
    ownership: OwnershipTarget,
    metrics: Metrics,
    transfer_lock: Mutex<()>,
}

/// Resolved filesystem paths for a validated request.
struct TransferPaths {
    source: PathBuf,
    target: PathBuf,
}

impl TransferEngine {
    /// Create an engine validating against `index` and applying `ownership`.
    #[must_use]
    pub fn new(index: DirectoryIndex, ownership: OwnershipTarget, metrics: Metrics) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                index,
                ownership,
                metrics,
                transfer_lock: Mutex::new(()),
            }),
        }
    }

    /// Index shared with the engine.
    #[must_use]
    pub fn index(&self) -> &DirectoryIndex {
        &self.inner.index
    }

    /// Ownership applied after each transfer.
    #[must_use]
    pub fn ownership(&self) -> OwnershipTarget {
        self.inner.ownership
    }

    /// Rename `source_root/item` to `destination_root/destination/item`, then rewrite ownership.
    ///
    /// Returns the path the item now lives at.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Rejected`] when validation fails, or a filesystem
    /// error when the rename or the ownership walk fails. A failed rename leaves
    /// the source in place and skips the ownership walk.
    pub fn move_item(&self, request: &TransferRequest) -> FsOpsResult<PathBuf> {
        self.transfer(TransferKind::Move, request)
    }

    /// Duplicate `source_root/item` into `destination_root/destination/item`, then rewrite ownership.
    ///
    /// Only directories and regular files are reproduced; symlinks and other
    /// special entries are skipped. The source is never modified.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Rejected`] when validation fails, or a filesystem
    /// error when copying or the ownership walk fails.
    pub fn copy_item(&self, request: &TransferRequest) -> FsOpsResult<PathBuf> {
        self.transfer(TransferKind::Copy, request)
    }

    fn transfer(&self, kind: TransferKind, request: &TransferRequest) -> FsOpsResult<PathBuf> {
        let _guard = self.lock_transfers();
        let result = self.transfer_locked(kind, request);
        match &result {
            Ok(target) => {
                self.inner.metrics.inc_transfer(kind.as_str(), "completed");
                info!(
                    operation = kind.as_str(),
                    source = %request.source_root,
                    item = %request.item,
                    destination = %target.display(),
                    "transfer completed"
                );
            }
            Err(FsOpsError::Rejected(rejection)) => {
                self.inner.metrics.inc_transfer(kind.as_str(), "rejected");
                warn!(
                    operation = kind.as_str(),
                    source = %request.source_root,
                    item = %request.item,
                    destination = %request.destination,
                    reason = %rejection,
                    "transfer rejected"
                );
            }
            Err(err) => {
                self.inner.metrics.inc_transfer(kind.as_str(), "failed");
                error!(
                    operation = kind.as_str(),
                    source = %request.source_root,
                    item = %request.item,
                    destination = %request.destination,
                    error = %err.describe(),
                    "transfer failed"
                );
            }
        }
        result
    }

    fn transfer_locked(&self, kind: TransferKind, request: &TransferRequest) -> FsOpsResult<PathBuf> {
        let paths = self.validate(request)?;
        match kind {
            TransferKind::Move => fs::rename(&paths.source, &paths.target)
                .map_err(|source| FsOpsError::io("transfer.rename", &paths.source, source))?,
            TransferKind::Copy => copy_tree(&paths.source, &paths.target)?,
        }
        apply_ownership(&paths.target, self.inner.ownership)?;
        Ok(paths.target)
    }

    fn validate(&self, request: &TransferRequest) -> FsOpsResult<TransferPaths> {
        if request.source_root.is_empty() {
            return Err(Rejection::MissingSource.into());
        }
        if request.item.is_empty() {
            return Err(Rejection::MissingItem.into());
        }
        if request.destination.is_empty() {
            return Err(Rejection::MissingDestination.into());
        }

        let index = &self.inner.index;
        let source_root = Path::new(&request.source_root);
        let destination_dir = index.destination_root().join(&request.destination);
        if source_root == destination_dir {
            return Err(Rejection::SameDirectory.into());
        }

        let listing = index.source_contents()?;
        let items = listing
            .get(source_root)
            .ok_or(Rejection::UnknownSource)?;
        if items.binary_search(&request.item).is_err() {
            return Err(Rejection::ItemNotFound.into());
        }

        let destinations = index.destination_dirs().map_err(|err| {
            warn!(error = %err.describe(), "destination listing failed during validation");
            Rejection::UnknownDestination
        })?;
        if destinations.binary_search(&request.destination).is_err() {
            return Err(Rejection::UnknownDestination.into());
        }

        Ok(TransferPaths {
            source: source_root.join(&request.item),
            target: destination_dir.join(&request.item),
        })
    }

    fn lock_transfers(&self) -> MutexGuard<'_, ()> {
        match self.inner.transfer_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("transfer mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }
}

/// Recreate `source` at `destination`, copying regular files and directories only.
///
/// A symlinked `source` is itself an irregular entry, so nothing is copied for it.
fn copy_tree(source: &Path, destination: &Path) -> FsOpsResult<()> {
    let mut directory_modes = Vec::new();

    for entry in WalkDir::new(source)
        .follow_links(false)
        .follow_root_links(false)
    {
        let entry =
            entry.map_err(|source_err| FsOpsError::walkdir("copy_tree.walk", source, source_err))?;
        let relative = entry.path().strip_prefix(source).unwrap_or_else(|_| Path::new(""));
        let target_path = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let metadata = entry.metadata().map_err(|source_err| {
                FsOpsError::walkdir("copy_tree.metadata", entry.path(), source_err)
            })?;
            fs::create_dir_all(&target_path).map_err(|source_err| {
                FsOpsError::io("copy_tree.create_dir", &target_path, source_err)
            })?;
            directory_modes.push((target_path, metadata.permissions().mode()));
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target_path).map_err(|source_err| {
                FsOpsError::io("copy_tree.copy_file", &target_path, source_err)
            })?;
        } else {
            debug!(path = %entry.path().display(), "skipping irregular entry");
        }
    }

    // Modes are applied deepest-first so read-only directories can still be filled.
    for (path, mode) in directory_modes.into_iter().rev() {
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))
            .map_err(|source_err| FsOpsError::io("copy_tree.set_mode", &path, source_err))?;
    }

    Ok(())
}

/// Set owner and group on `destination` and everything below it.
///
/// Symlinks are rewritten themselves and never descended into, including a
/// symlinked `destination`. A missing `destination` (a copied symlink item)
/// touches nothing. Stops at the first failure; entries already rewritten
/// stay rewritten.
fn apply_ownership(destination: &Path, ownership: OwnershipTarget) -> FsOpsResult<usize> {
    match fs::symlink_metadata(destination) {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %destination.display(), "nothing to rewrite ownership on");
            return Ok(0);
        }
        Err(err) => return Err(FsOpsError::io("ownership.stat", destination, err)),
    }

    let uid = Uid::from_raw(ownership.uid);
    let gid = Gid::from_raw(ownership.gid);
    let mut touched = 0;

    for entry in WalkDir::new(destination)
        .follow_links(false)
        .follow_root_links(false)
    {
        let entry = entry.map_err(|source_err| {
            FsOpsError::walkdir("ownership.walk", destination, source_err)
        })?;
        let path = entry.path();
        if entry.path_is_symlink() {
            lchown(path, Some(ownership.uid), Some(ownership.gid))
                .map_err(|source_err| FsOpsError::io("ownership.lchown", path, source_err))?;
        } else {
            chown(path, Some(uid), Some(gid)).map_err(|source_err| FsOpsError::Nix {
                operation: "ownership.chown",
                path: path.to_path_buf(),
                source: source_err,
            })?;
        }
        touched += 1;
    }

    debug!(path = %destination.display(), entries = touched, "ownership applied");
    Ok(touched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use ferry_test_support::fixtures::{MockTree, current_ownership, relative_entries};
    use std::os::unix::fs::{MetadataExt, symlink};
    use std::thread;
    use std::time::Duration;

    fn engine_for(tree: &MockTree) -> Result<TransferEngine> {
        Ok(TransferEngine::new(
            DirectoryIndex::new(&tree.layout()),
            current_ownership(),
            Metrics::new()?,
        ))
    }

    fn source_str(tree: &MockTree, index: usize) -> String {
        tree.source(index).to_string_lossy().into_owned()
    }

    #[test]
    fn copy_tree_preserves_modes_and_skips_symlinks() -> Result<()> {
        let tree = MockTree::new()?;
        let source = tree.source(0).join("dir1");
        fs::set_permissions(source.join("subdir1/file1"), fs::Permissions::from_mode(0o640))?;
        fs::set_permissions(source.join("subdir2"), fs::Permissions::from_mode(0o750))?;
        symlink(source.join("subdir1/file1"), source.join("link"))?;

        let target = tree.land("land1").join("dir1");
        copy_tree(&source, &target)?;

        assert!(!target.join("link").exists());
        assert!(fs::symlink_metadata(target.join("link")).is_err());
        let file_mode = fs::metadata(target.join("subdir1/file1"))?.permissions().mode();
        assert_eq!(file_mode & 0o777, 0o640);
        let dir_mode = fs::metadata(target.join("subdir2"))?.permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o750);
        assert_eq!(fs::read(target.join("subdir2/file2"))?, b"file2");
        Ok(())
    }

    #[test]
    fn apply_ownership_covers_top_level_and_children() -> Result<()> {
        let tree = MockTree::new()?;
        let owner = current_ownership();
        let root = tree.source(0).join("dir2");

        let touched = apply_ownership(&root, owner)?;
        // dir2, two subdirectories, four files.
        assert_eq!(touched, 7);
        for entry in WalkDir::new(&root) {
            let metadata = entry?.metadata()?;
            assert_eq!(metadata.uid(), owner.uid);
            assert_eq!(metadata.gid(), owner.gid);
        }
        Ok(())
    }

    #[test]
    fn apply_ownership_stops_at_symlinked_root() -> Result<()> {
        let tree = MockTree::new()?;
        let outside = tree.path().join("outside");
        fs::create_dir_all(outside.join("nested"))?;
        fs::write(outside.join("nested/secret"), b"secret")?;
        let link = tree.land("land1").join("link");
        symlink(&outside, &link)?;

        assert_eq!(apply_ownership(&link, current_ownership())?, 1);
        Ok(())
    }

    #[test]
    fn apply_ownership_on_missing_path_touches_nothing() -> Result<()> {
        let tree = MockTree::new()?;
        let missing = tree.land("land1").join("never-created");
        assert_eq!(apply_ownership(&missing, current_ownership())?, 0);
        Ok(())
    }

    #[test]
    fn copy_tree_skips_symlinked_root() -> Result<()> {
        let tree = MockTree::new()?;
        let link = tree.source(0).join("link");
        symlink(tree.source(1).join("dir1"), &link)?;

        let target = tree.land("land1").join("link");
        copy_tree(&link, &target)?;

        assert!(fs::symlink_metadata(&target).is_err());
        Ok(())
    }

    #[test]
    fn unreadable_destination_root_rejects_as_unknown_destination() -> Result<()> {
        let tree = MockTree::new()?;
        let engine = engine_for(&tree)?;
        fs::remove_dir_all(tree.destination_root())?;

        let err = engine
            .move_item(&TransferRequest::new(source_str(&tree, 0), "file1", "land1"))
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected rejection"))?;
        assert_eq!(err.rejection(), Some(Rejection::UnknownDestination));
        assert_eq!(err.describe(), "destination directory not accessible");
        assert!(tree.source(0).join("file1").is_file());
        Ok(())
    }

    #[test]
    fn validation_order_reports_first_failure() -> Result<()> {
        let tree = MockTree::new()?;
        let engine = engine_for(&tree)?;
        let src = source_str(&tree, 0);
        let dest_root = tree.destination_root().to_string_lossy().into_owned();

        let cases = [
            (TransferRequest::new("", "", ""), Rejection::MissingSource),
            (TransferRequest::new(src.as_str(), "", ""), Rejection::MissingItem),
            (
                TransferRequest::new(src.as_str(), "file1", ""),
                Rejection::MissingDestination,
            ),
            (
                TransferRequest::new(format!("{dest_root}/land1"), "x", "land1"),
                Rejection::SameDirectory,
            ),
            (
                TransferRequest::new("/not/configured", "file1", "land1"),
                Rejection::UnknownSource,
            ),
            (
                TransferRequest::new(src.as_str(), "exclude1", "land1"),
                Rejection::ItemNotFound,
            ),
            (
                TransferRequest::new(src.as_str(), "file1", "exclude1"),
                Rejection::UnknownDestination,
            ),
        ];

        for (request, expected) in cases {
            let err = engine
                .move_item(&request)
                .err()
                .ok_or_else(|| anyhow::anyhow!("expected rejection for {request:?}"))?;
            assert_eq!(err.rejection(), Some(expected), "request {request:?}");
        }
        assert!(tree.source(0).join("file1").is_file());
        Ok(())
    }

    #[test]
    fn transfers_wait_for_the_engine_lock() -> Result<()> {
        let tree = MockTree::new()?;
        let engine = engine_for(&tree)?;
        let request = TransferRequest::new(source_str(&tree, 0), "file1", "land1");

        let guard = engine.lock_transfers();
        let worker = {
            let engine = engine.clone();
            let request = request.clone();
            thread::spawn(move || engine.move_item(&request).map(|_| ()))
        };
        thread::sleep(Duration::from_millis(100));
        assert!(tree.source(0).join("file1").exists());
        assert!(!tree.land("land1").join("file1").exists());
        drop(guard);

        worker
            .join()
            .map_err(|_| anyhow::anyhow!("transfer thread panicked"))??;
        assert!(tree.land("land1").join("file1").is_file());
        assert!(!tree.source(0).join("file1").exists());
        Ok(())
    }

    #[test]
    fn copy_reproduces_entire_subtree() -> Result<()> {
        let tree = MockTree::new()?;
        let engine = engine_for(&tree)?;
        fs::write(tree.source(0).join("dir1/extraFile"), b"extra")?;

        let target = engine.copy_item(&TransferRequest::new(source_str(&tree, 0), "dir1", "land1"))?;

        assert_eq!(target, tree.land("land1").join("dir1"));
        assert_eq!(
            relative_entries(&tree.source(0).join("dir1"))?,
            relative_entries(&target)?
        );
        // The untouched sibling root still matches the copied source.
        let mut expected = relative_entries(&tree.source(1).join("dir1"))?;
        expected.push(PathBuf::from("extraFile"));
        expected.sort();
        assert_eq!(relative_entries(&tree.source(0).join("dir1"))?, expected);
        Ok(())
    }
}
