//! Size and hash classification.
//!
//! # Overview
//!
//! Duplicate detection narrows candidates in two passes:
//!
//! 1. [`classify_by_size`] keeps only files whose exact size occurs at least
//!    twice. Files of different sizes cannot be duplicates, so this removes
//!    most candidates before any content is read.
//! 2. [`classify_by_hash`] groups successfully fingerprinted files by
//!    `(size, hash)` and keeps groups of two or more as [`DuplicateGroup`]s.
//!    Failed results never join a group; they are handed back separately.
//!
//! # Example
//!
//! ```
//! use dupfind::duplicates::classify_by_size;
//! use dupfind::scanner::FileDescriptor;
//!
//! let files = vec![
//!     FileDescriptor::new("/a.txt", 100),
//!     FileDescriptor::new("/b.txt", 200),
//!     FileDescriptor::new("/c.txt", 100),
//! ];
//!
//! let candidates = classify_by_size(files);
//! assert_eq!(candidates.len(), 2);
//! assert_eq!(candidates[0].path.to_str(), Some("/a.txt"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::fingerprint::FingerprintResult;
use crate::scanner::FileDescriptor;

/// Files sharing one size and one content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Lowercase hex digest shared by every file
    pub hash: String,
    /// File size in bytes, shared by every file
    pub size: u64,
    /// The duplicates, sorted by path
    pub files: Vec<FileDescriptor>,
}

impl DuplicateGroup {
    /// Create a group; files are sorted by path.
    #[must_use]
    pub fn new(hash: String, size: u64, mut files: Vec<FileDescriptor>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { hash, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Space held by the redundant copies (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of redundant copies.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Keep only files whose exact size occurs at least twice.
///
/// The output preserves input order, so equal-size files keep their relative
/// order too.
#[must_use]
pub fn classify_by_size(files: Vec<FileDescriptor>) -> Vec<FileDescriptor> {
    let mut counts: HashMap<u64, usize> = HashMap::with_capacity(files.len());
    for file in &files {
        *counts.entry(file.size).or_default() += 1;
    }

    files
        .into_iter()
        .filter(|file| counts.get(&file.size).is_some_and(|&n| n >= 2))
        .collect()
}

/// Group successful fingerprints by `(size, hash)`.
///
/// Returns the duplicate groups (two or more files each, sorted by hash) and
/// every failed result, untouched, for diagnostics.
#[must_use]
pub fn classify_by_hash(
    results: impl IntoIterator<Item = FingerprintResult>,
) -> (Vec<DuplicateGroup>, Vec<FingerprintResult>) {
    let mut by_hash: HashMap<(u64, String), Vec<FileDescriptor>> = HashMap::new();
    let mut errors = Vec::new();

    for result in results {
        match result.outcome {
            Ok(hash) => by_hash
                .entry((result.descriptor.size, hash))
                .or_default()
                .push(result.descriptor),
            Err(e) => errors.push(FingerprintResult::failed(result.descriptor, e)),
        }
    }

    let mut groups: Vec<DuplicateGroup> = by_hash
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|((size, hash), files)| {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                hash,
                files.len(),
                size
            );
            DuplicateGroup::new(hash, size, files)
        })
        .collect();

    groups.sort_by(|a, b| a.hash.cmp(&b.hash).then(a.size.cmp(&b.size)));

    (groups, errors)
}
