//! Duplicate finder pipeline orchestration.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs the full pipeline over a directory tree:
//!
//! 1. **Walk**: collect candidate files with the configured filters
//! 2. **Size classification**: drop files whose size is unique
//! 3. **Fingerprinting**: hash the remaining files concurrently
//! 4. **Hash classification**: group equal hashes into [`DuplicateGroup`]s
//!
//! The result is a [`DuplicateReport`]. Per-file failures and unreadable
//! directory entries end up in the report, never as an `Err`. A shutdown
//! request also produces a report, marked partial.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::groups::{classify_by_hash, classify_by_size, DuplicateGroup};
use crate::fingerprint::{FingerprintConfig, FingerprintEngine, FingerprintResult, HashAlgorithm};
use crate::progress::{ProgressCallback, PHASE_WALKING};
use crate::scanner::{FileDescriptor, ScanError, Walker, WalkerConfig};
use crate::signal::ShutdownHandler;
use crate::workers::PoolError;

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Algorithm and worker count for fingerprinting.
    pub fingerprint: FingerprintConfig,
    /// Walker configuration for directory traversal.
    pub walker: WalkerConfig,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("fingerprint", &self.fingerprint)
            .field("walker", &self.walker)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    #[must_use]
    pub fn with_fingerprint(mut self, config: FingerprintConfig) -> Self {
        self.fingerprint = config;
        self
    }

    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker = config;
        self
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    /// Algorithm used for fingerprints
    pub algorithm: HashAlgorithm,
    /// Worker count used for fingerprinting
    pub workers: usize,
    /// Total number of files enumerated
    pub total_files: usize,
    /// Total size of all enumerated files in bytes
    pub total_size: u64,
    /// Files eliminated because their size was unique
    pub eliminated_by_size: usize,
    /// Files submitted for fingerprinting
    pub candidates: usize,
    /// Files hashed successfully
    pub hashed_files: usize,
    /// Files that could not be hashed
    pub failed_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of redundant copies (excluding one original per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether the scan was cut short by a shutdown request
    pub interrupted: bool,
}

impl ScanSummary {
    /// Percentage of the scanned bytes held by redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Final output of a scan.
#[derive(Debug, Default)]
pub struct DuplicateReport {
    /// Confirmed duplicate groups, sorted by hash
    pub groups: Vec<DuplicateGroup>,
    /// Files that could not be fingerprinted
    pub errors: Vec<FingerprintResult>,
    /// Entries the walker could not read
    pub scan_errors: Vec<ScanError>,
    pub summary: ScanSummary,
}

impl DuplicateReport {
    /// Every duplicate as `(hash, size, path)`, sorted by hash then path.
    #[must_use]
    pub fn entries(&self) -> Vec<(&str, u64, &Path)> {
        let mut entries: Vec<(&str, u64, &Path)> = self
            .groups
            .iter()
            .flat_map(|group| {
                group
                    .files
                    .iter()
                    .map(move |file| (group.hash.as_str(), group.size, file.path.as_path()))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.2.cmp(b.2)));
        entries
    }

    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// The scan was interrupted, so the groups may be incomplete.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.summary.interrupted
    }

    /// Number of per-file and walk errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len() + self.scan_errors.len()
    }
}

/// Errors that stop a scan before it produces a report.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The fingerprint workers could not be started.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Duplicate finder that orchestrates the detection pipeline.
///
/// # Example
///
/// ```no_run
/// use dupfind::duplicates::{DuplicateFinder, FinderConfig};
/// use dupfind::signal::ShutdownHandler;
/// use std::path::Path;
///
/// let finder = DuplicateFinder::new(FinderConfig::default(), ShutdownHandler::new());
/// let report = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// for (hash, size, path) in report.entries() {
///     println!("{hash}\t{size}\t{}", path.display());
/// }
/// println!("Reclaimable space: {}", report.summary.reclaimable_display());
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    shutdown: ShutdownHandler,
}

impl DuplicateFinder {
    #[must_use]
    pub fn new(config: FinderConfig, shutdown: ShutdownHandler) -> Self {
        Self { config, shutdown }
    }

    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `path`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if the path does not exist, is not a directory,
    /// or the worker threads cannot be started.
    pub fn find_duplicates(&self, path: &Path) -> Result<DuplicateReport, FinderError> {
        let start_time = Instant::now();

        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }

        log::info!("Starting duplicate scan of {}", path.display());

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
            callback.on_message(&format!("Walking {}", path.display()));
        }

        let mut walker =
            Walker::new(path, self.config.walker.clone()).with_shutdown(self.shutdown.clone());
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(Arc::clone(callback));
        }

        let mut files = Vec::new();
        let mut scan_errors = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => files.push(file),
                Err(e) => scan_errors.push(e),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        log::info!(
            "Found {} files ({} unreadable entries)",
            files.len(),
            scan_errors.len()
        );

        let mut report = if self.shutdown.is_shutdown_requested() {
            log::info!("Scan interrupted during directory walk");
            let mut report = DuplicateReport::default();
            report.summary = self.base_summary(&files);
            report.summary.interrupted = true;
            report
        } else {
            self.find_duplicates_from_files(files)?
        };

        report.scan_errors = scan_errors;
        report.summary.scan_duration = start_time.elapsed();
        Ok(report)
    }

    /// Find duplicates from a pre-collected list of files.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Pool`] if the worker threads cannot be started.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileDescriptor>,
    ) -> Result<DuplicateReport, FinderError> {
        let start_time = Instant::now();
        let mut summary = self.base_summary(&files);

        let candidates = classify_by_size(files);
        summary.candidates = candidates.len();
        summary.eliminated_by_size = summary.total_files - candidates.len();

        log::info!(
            "Size classification: {} -> {} candidates",
            summary.total_files,
            summary.candidates
        );

        let mut engine = FingerprintEngine::new(self.config.fingerprint, self.shutdown.clone());
        if let Some(ref callback) = self.config.progress_callback {
            engine = engine.with_progress_callback(Arc::clone(callback));
        }
        let outcome = engine.hash_files(candidates)?;

        summary.hashed_files = outcome.stats.hashed_files;
        summary.failed_files = outcome.stats.failed_files;
        summary.bytes_hashed = outcome.stats.bytes_hashed;
        summary.interrupted = outcome.stats.interrupted;

        let (groups, errors) = classify_by_hash(outcome.results);

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan {}: {} duplicate groups, {} duplicate files, {} reclaimable",
            if summary.interrupted { "interrupted" } else { "complete" },
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok(DuplicateReport {
            groups,
            errors,
            scan_errors: Vec::new(),
            summary,
        })
    }

    fn base_summary(&self, files: &[FileDescriptor]) -> ScanSummary {
        ScanSummary {
            algorithm: self.config.fingerprint.algorithm(),
            workers: self.config.fingerprint.workers(),
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            ..Default::default()
        }
    }
}
