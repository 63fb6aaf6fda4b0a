//! Removal of redundant duplicate copies.
//!
//! # Overview
//!
//! Deletion only ever runs on a finished [`DuplicateReport`], on the calling
//! thread, one file at a time:
//!
//! - [`plan_deletions`] keeps the first file of each group (by path) and
//!   marks the rest for removal
//! - [`delete_duplicates`] refuses partial reports, then removes every marked
//!   file, moving it to the system trash unless permanent deletion is asked for
//! - before each removal the file's current size is compared with the size
//!   recorded at scan time; a mismatch is skipped as [`DeleteError::Modified`]
//!
//! # Example
//!
//! ```no_run
//! use dupfind::actions::delete::{delete_duplicates, DeleteConfig};
//! use dupfind::duplicates::{DuplicateFinder, FinderConfig};
//! use dupfind::signal::ShutdownHandler;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default(), ShutdownHandler::new());
//! let report = finder.find_duplicates(Path::new("/data")).unwrap();
//!
//! let result = delete_duplicates(&report, &DeleteConfig::trash()).unwrap();
//! println!("{}", result.summary());
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::DuplicateReport;
use crate::scanner::FileDescriptor;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size changed since it was hashed.
    #[error("file modified since scan: {path} (size {expected} -> {actual})")]
    Modified {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// The kept copy vanished or changed; its group was left untouched.
    #[error("kept copy {path} is no longer intact ({reason}); group skipped")]
    KeeperChanged { path: PathBuf, reason: String },

    /// Attempted to delete all copies (at least one must be preserved).
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// The report came from an interrupted scan.
    #[error("refusing to delete from a partial scan; rerun without interruption")]
    PartialReport,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::KeeperChanged { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted | Self::PartialReport => None,
        }
    }

    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Result of a successful deletion operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

/// Results of a batch deletion operation.
#[derive(Debug, Default)]
pub struct BatchDeleteResult {
    pub successes: Vec<DeleteResult>,
    pub failures: Vec<DeleteError>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Deleted {} file(s), freed {}",
                self.success_count(),
                ByteSize::b(self.bytes_freed)
            )
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                ByteSize::b(self.bytes_freed)
            )
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteConfig {
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
}

impl DeleteConfig {
    #[must_use]
    pub fn trash() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn permanent() -> Self {
        Self { permanent: true }
    }
}

/// One group's deletion decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    /// The copy that stays.
    pub keep: FileDescriptor,
    /// Copies to remove.
    pub remove: Vec<FileDescriptor>,
}

/// Keep the first file of every group by path; every other copy is removed.
#[must_use]
pub fn plan_deletions(report: &DuplicateReport) -> Vec<DeletionPlan> {
    report
        .groups
        .iter()
        .filter_map(|group| {
            let mut files = group.files.clone();
            files.sort_by(|a, b| a.path.cmp(&b.path));
            let mut files = files.into_iter();
            let keep = files.next()?;
            let remove: Vec<_> = files.collect();
            (!remove.is_empty()).then_some(DeletionPlan { keep, remove })
        })
        .collect()
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// `NotFound`, `PermissionDenied` or `TrashFailed`.
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: false,
    })
}

/// Permanently delete a single file. This cannot be undone.
///
/// # Errors
///
/// `NotFound`, `PermissionDenied` or `PermanentDeleteFailed`.
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: true,
    })
}

/// Delete `file` after checking that its size still matches the scan.
///
/// # Errors
///
/// `Modified` if the size changed, otherwise any error from the delete itself.
pub fn delete_verified(
    file: &FileDescriptor,
    config: &DeleteConfig,
) -> Result<DeleteResult, DeleteError> {
    let actual = fs::metadata(&file.path)
        .map_err(|e| DeleteError::from_io(&file.path, e))?
        .len();

    if actual != file.size {
        log::warn!(
            "File modified since scan: {} (size changed from {} to {})",
            file.path.display(),
            file.size,
            actual
        );
        return Err(DeleteError::Modified {
            path: file.path.clone(),
            expected: file.size,
            actual,
        });
    }

    if config.permanent {
        permanent_delete(&file.path)
    } else {
        delete_to_trash(&file.path)
    }
}

/// Remove every redundant copy listed in `report`.
///
/// A group is skipped, with a [`DeleteError::KeeperChanged`] failure, when its
/// kept copy is missing or no longer has the scanned size.
///
/// # Errors
///
/// [`DeleteError::PartialReport`] if the scan was interrupted, or
/// [`DeleteError::AllCopiesWouldBeDeleted`] if a plan would leave a group
/// empty. Per-file failures are collected in the result instead.
pub fn delete_duplicates(
    report: &DuplicateReport,
    config: &DeleteConfig,
) -> Result<BatchDeleteResult, DeleteError> {
    if report.is_partial() {
        return Err(DeleteError::PartialReport);
    }

    let plans = plan_deletions(report);
    for plan in &plans {
        let selected: Vec<PathBuf> = plan.remove.iter().map(|f| f.path.clone()).collect();
        let mut group: Vec<PathBuf> = selected.clone();
        group.push(plan.keep.path.clone());
        validate_preserves_copy(&selected, &group)?;
    }

    let mut result = BatchDeleteResult::default();

    for plan in &plans {
        if let Err(e) = check_keeper(&plan.keep) {
            log::warn!("{e}");
            result.failures.push(e);
            continue;
        }
        for file in &plan.remove {
            match delete_verified(file, config) {
                Ok(deleted) => {
                    result.bytes_freed += deleted.size;
                    result.successes.push(deleted);
                }
                Err(e) => {
                    log::warn!("Failed to delete {}: {}", file.path.display(), e);
                    result.failures.push(e);
                }
            }
        }
    }

    log::info!("{}", result.summary());
    Ok(result)
}

fn check_keeper(keep: &FileDescriptor) -> Result<(), DeleteError> {
    let changed = |reason: String| DeleteError::KeeperChanged {
        path: keep.path.clone(),
        reason,
    };
    let metadata = fs::metadata(&keep.path).map_err(|e| changed(e.to_string()))?;
    if !metadata.is_file() {
        return Err(changed("not a regular file".to_string()));
    }
    if metadata.len() != keep.size {
        return Err(changed(format!(
            "size {} -> {}",
            keep.size,
            metadata.len()
        )));
    }
    Ok(())
}

/// Validate that a selection doesn't delete all copies.
///
/// ```
/// use dupfind::actions::delete::validate_preserves_copy;
/// use std::path::PathBuf;
///
/// let group = vec![PathBuf::from("/original.txt"), PathBuf::from("/copy1.txt")];
///
/// assert!(validate_preserves_copy(&[PathBuf::from("/copy1.txt")], &group).is_ok());
/// assert!(validate_preserves_copy(&group, &group).is_err());
/// ```
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if nothing in `group_paths` survives.
pub fn validate_preserves_copy(
    selected_paths: &[PathBuf],
    group_paths: &[PathBuf],
) -> Result<(), DeleteError> {
    let selected_set: HashSet<&PathBuf> = selected_paths.iter().collect();
    let preserved_count = group_paths
        .iter()
        .filter(|p| !selected_set.contains(p))
        .count();

    if preserved_count == 0 {
        log::error!(
            "Attempted to delete all {} copies of a duplicate group",
            group_paths.len()
        );
        Err(DeleteError::AllCopiesWouldBeDeleted)
    } else {
        Ok(())
    }
}
