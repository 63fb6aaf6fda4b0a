//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker`] traverses a directory tree and yields a [`FileDescriptor`] for
//! every regular file that passes the configured filters:
//!
//! - size bounds (`min_size`, `max_size`)
//! - excluded extensions (case-insensitive, `.ext` form)
//! - excluded directory names, pruned together with their subtree
//! - gitignore-style patterns via the `ignore` crate
//! - hidden entries and symlinks
//!
//! Entries that cannot be read are yielded as [`ScanError`] values and the walk
//! continues. The walker stops early once the shutdown handler fires.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{FileDescriptor, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;
use crate::signal::ShutdownHandler;

/// Directory walker for parallel file discovery.
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
    shutdown: Option<ShutdownHandler>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown", &self.shutdown)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown: None,
            progress_callback: None,
        }
    }

    /// Stop iteration as soon as `shutdown` fires.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownHandler) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Report every accepted file to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(ShutdownHandler::is_shutdown_requested)
    }

    /// Build gitignore matcher from config patterns and a root .gitignore file.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    fn passes_size_filter(&self, size: u64) -> bool {
        if size < self.config.min_size {
            return false;
        }
        self.config.max_size.is_none_or(|max| size <= max)
    }

    /// Walk the directory tree, yielding file descriptors.
    ///
    /// Children are visited in file-name order, so repeated walks over an
    /// unchanged tree yield the same sequence.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileDescriptor, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let exclude_exts = self.config.normalized_exts();
        let exclude_dirs = Arc::new(self.config.normalized_dirs());
        let mut accepted = 0usize;
        let mut seen_targets: HashSet<PathBuf> = HashSet::new();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Pruning here keeps jwalk from ever reading excluded subtrees.
                children.retain(|child| match child {
                    Ok(entry) => {
                        !(entry.file_type().is_dir()
                            && is_excluded_dir(&entry.file_name, &exclude_dirs))
                    }
                    Err(_) => true,
                });
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| {
                let result = match entry_result {
                    Ok(entry) => {
                        if entry.depth == 0 || entry.file_type().is_dir() {
                            return None;
                        }
                        self.process_entry(
                            entry.path(),
                            entry.file_type().is_symlink(),
                            &gitignore,
                            &exclude_exts,
                        )?
                    }
                    Err(e) => {
                        let path = e
                            .path()
                            .map_or_else(|| self.root.clone(), Path::to_path_buf);
                        Err(self.handle_jwalk_error(path, e))
                    }
                };

                // Under follow_symlinks a link and its target are one file.
                if let Ok(file) = &result {
                    if self.config.follow_symlinks
                        && !seen_targets.insert(canonical_path(&file.path))
                    {
                        log::trace!("Skipping second path to a seen file: {}", file.path.display());
                        return None;
                    }
                }

                if let (Ok(file), Some(callback)) = (&result, &self.progress_callback) {
                    accepted += 1;
                    callback.on_progress(accepted, file.path.to_string_lossy().as_ref());
                }
                Some(result)
            })
    }

    /// Apply the per-file filters; `None` means the file is skipped silently.
    fn process_entry(
        &self,
        path: PathBuf,
        is_symlink: bool,
        gitignore: &Option<Gitignore>,
        exclude_exts: &[String],
    ) -> Option<Result<FileDescriptor, ScanError>> {
        if is_symlink && !self.config.follow_symlinks {
            log::trace!("Skipping symlink: {}", path.display());
            return None;
        }

        if let Some(gi) = gitignore {
            if gi.matched_path_or_any_parents(&path, false).is_ignore() {
                log::trace!("Ignoring file: {}", path.display());
                return None;
            }
        }

        if has_excluded_ext(&path, exclude_exts) {
            log::trace!("Skipping excluded extension: {}", path.display());
            return None;
        }

        let metadata = if self.config.follow_symlinks {
            std::fs::metadata(&path)
        } else {
            std::fs::symlink_metadata(&path)
        };
        let metadata = match metadata {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_io_error(path, e))),
        };

        if !metadata.is_file() {
            return None;
        }

        let size = metadata.len();
        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        Some(Ok(FileDescriptor::new(path, size)))
    }

    fn handle_io_error(&self, path: PathBuf, error: std::io::Error) -> ScanError {
        let err = ScanError::from_io(path, error);
        match &err {
            ScanError::NotFound(p) => {
                log::debug!("File not found (may have been deleted): {}", p.display());
            }
            other => log::warn!("{}", other),
        }
        err
    }

    fn handle_jwalk_error(&self, path: PathBuf, error: jwalk::Error) -> ScanError {
        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
            Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
            _ => ScanError::Io {
                path,
                source: std::io::Error::other(error.to_string()),
            },
        }
    }
}

/// Resolved path of `path`, or `path` itself if it cannot be resolved.
fn canonical_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_excluded_dir(name: &OsStr, exclude_dirs: &[String]) -> bool {
    !exclude_dirs.is_empty() && exclude_dirs.contains(&name.to_string_lossy().to_lowercase())
}

fn has_excluded_ext(path: &Path, exclude_exts: &[String]) -> bool {
    if exclude_exts.is_empty() {
        return false;
    }
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .is_some_and(|ext| exclude_exts.contains(&ext))
}
