//! Duplicate detection.
//!
//! - [`groups`]: size and hash classification, [`DuplicateGroup`]
//! - [`finder`]: the walk → size → fingerprint → hash pipeline

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, DuplicateReport, FinderConfig, FinderError, ScanSummary};
pub use groups::{classify_by_hash, classify_by_size, DuplicateGroup};
