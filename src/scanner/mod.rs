//! Scanner module: directory enumeration and the candidate file model.
//!
//! The scanner is the producer side of the pipeline. It walks a directory
//! tree with [`Walker`], applies the path, size and extension filters from
//! [`WalkerConfig`], and emits one [`FileDescriptor`] per regular file.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: 1024,
//!     exclude_dirs: vec!["node_modules".to_string()],
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod walker;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use walker::Walker;

/// A candidate file: where it is and how big it was when enumerated.
///
/// Descriptors are created once by the walker and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes at enumeration time
    pub size: u64,
}

impl FileDescriptor {
    /// Create a new descriptor.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Minimum file size to include, in bytes. `0` keeps empty files.
    pub min_size: u64,

    /// Maximum file size to include, in bytes.
    pub max_size: Option<u64>,

    /// File extensions to skip (".jpg", "png", ...), matched case-insensitively.
    pub exclude_exts: Vec<String>,

    /// Directory names to prune together with their subtree, matched case-insensitively.
    pub exclude_dirs: Vec<String>,

    /// Glob patterns to ignore (gitignore-style), in addition to a root `.gitignore`.
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl WalkerConfig {
    /// Extension filter as lowercase, dot-prefixed entries.
    #[must_use]
    pub fn normalized_exts(&self) -> Vec<String> {
        self.exclude_exts
            .iter()
            .map(|ext| normalize_ext(ext))
            .filter(|ext| ext.len() > 1)
            .collect()
    }

    /// Directory filter as lowercase names.
    #[must_use]
    pub fn normalized_dirs(&self) -> Vec<String> {
        self.exclude_dirs
            .iter()
            .map(|dir| dir.trim().to_lowercase())
            .filter(|dir| !dir.is_empty())
            .collect()
    }
}

/// Normalize an extension to the `.ext` lowercase form.
///
/// ```
/// use dupfind::scanner::normalize_ext;
///
/// assert_eq!(normalize_ext("JPG"), ".jpg");
/// assert_eq!(normalize_ext(".Png"), ".png");
/// ```
#[must_use]
pub fn normalize_ext(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => p,
        }
    }
}
