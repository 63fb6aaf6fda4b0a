//! dupfind - Concurrent Duplicate File Finder
//!
//! Finds files with identical content under a directory tree. Candidates are
//! narrowed by size, fingerprinted by a bounded pool of workers with a
//! selectable hash algorithm, and grouped by `(size, hash)`.
//!
//! ```no_run
//! use dupfind::duplicates::{DuplicateFinder, FinderConfig};
//! use dupfind::fingerprint::FingerprintConfig;
//! use dupfind::signal::ShutdownHandler;
//! use std::path::Path;
//!
//! let config = FinderConfig::default()
//!     .with_fingerprint(FingerprintConfig::new("blake3", 4).unwrap());
//! let report = DuplicateFinder::new(config, ShutdownHandler::new())
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//!
//! for (hash, size, path) in report.entries() {
//!     println!("{hash}\t{size}\t{}", path.display());
//! }
//! ```

pub mod actions;
pub mod app;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod workers;

pub use app::run_app;
