//! Concurrent fingerprint engine.
//!
//! # Overview
//!
//! [`FingerprintEngine`] hashes a batch of size-filtered candidates over a
//! [`WorkerPool`] of exactly `workers` tasks:
//!
//! 1. Every descriptor is queued on a crossbeam channel that is closed right
//!    after, so workers stop once it drains.
//! 2. Each worker checks an accumulator out of a shared [`HasherPool`],
//!    streams the file through it in [`CHUNK_SIZE`] reads, and returns the
//!    lowercase hex digest.
//! 3. Results come back in completion order, not submission order.
//!
//! Per-file I/O errors become failed [`FingerprintResult`]s. Shutdown is
//! polled after every chunk; the file being read at that moment produces no
//! result at all, while results already delivered are kept.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::fingerprint::{FingerprintConfig, FingerprintEngine};
//! use dupfind::scanner::FileDescriptor;
//! use dupfind::signal::ShutdownHandler;
//!
//! let config = FingerprintConfig::new("blake3", 4).unwrap();
//! let engine = FingerprintEngine::new(config, ShutdownHandler::new());
//!
//! let files = vec![
//!     FileDescriptor::new("/data/a.bin", 1024),
//!     FileDescriptor::new("/data/b.bin", 1024),
//! ];
//! let outcome = engine.hash_files(files).unwrap();
//! for result in &outcome.results {
//!     println!("{:?} {}", result.hash(), result.descriptor.path.display());
//! }
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::Arc;

use super::pool::HasherPool;
use super::{hash_to_hex, FingerprintConfig, FingerprintError, FingerprintResult};
use crate::progress::{ProgressCallback, PHASE_HASHING};
use crate::scanner::FileDescriptor;
use crate::signal::ShutdownHandler;
use crate::workers::{PoolConfig, PoolError, WorkerPool};

/// Read size used while streaming file contents (64 KiB).
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Files larger than this are logged at debug level before hashing.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Statistics from one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintStats {
    /// Files submitted to the engine
    pub input_files: usize,
    /// Files hashed successfully
    pub hashed_files: usize,
    /// Files that failed with an I/O error
    pub failed_files: usize,
    /// Bytes covered by successful hashes
    pub bytes_hashed: u64,
    /// Accumulators the pool had to create
    pub accumulators_created: usize,
    /// Shutdown cut the run short; results are a partial set
    pub interrupted: bool,
}

/// Results plus statistics from [`FingerprintEngine::hash_files`].
#[derive(Debug, Default)]
pub struct FingerprintOutcome {
    /// One entry per file processed before shutdown, in completion order.
    pub results: Vec<FingerprintResult>,
    pub stats: FingerprintStats,
}

/// Hashes batches of files concurrently.
pub struct FingerprintEngine {
    config: FingerprintConfig,
    shutdown: ShutdownHandler,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FingerprintEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintEngine")
            .field("config", &self.config)
            .field("shutdown", &self.shutdown)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FingerprintEngine {
    /// Create an engine from a validated config.
    #[must_use]
    pub fn new(config: FingerprintConfig, shutdown: ShutdownHandler) -> Self {
        Self {
            config,
            shutdown,
            progress_callback: None,
        }
    }

    /// Report hashing progress to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    #[must_use]
    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    /// Start hashing `files` and return the completion stream.
    ///
    /// The iterator yields results as workers finish them and ends once all
    /// workers have exited. Dropping it early stops the workers.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] if the worker threads cannot be started.
    pub fn stream(
        &self,
        files: Vec<FileDescriptor>,
    ) -> Result<impl Iterator<Item = FingerprintResult>, PoolError> {
        let pool = Arc::new(HasherPool::new(
            self.config.algorithm(),
            self.config.workers(),
        ));
        self.spawn(files, pool)
    }

    fn spawn(
        &self,
        files: Vec<FileDescriptor>,
        hashers: Arc<HasherPool>,
    ) -> Result<impl Iterator<Item = FingerprintResult>, PoolError> {
        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded();
        for file in files {
            // The receiver is alive in this scope, so sending cannot fail.
            let _ = jobs_tx.send(file);
        }
        drop(jobs_tx);

        let shutdown = self.shutdown.clone();
        let handler = move |file: FileDescriptor| {
            if file.size > LARGE_FILE_THRESHOLD {
                log::debug!(
                    "Hashing large file ({} MB): {}",
                    file.size / (1024 * 1024),
                    file.path.display()
                );
            }
            match hash_file(&file.path, &hashers, &shutdown) {
                Ok(hash) => {
                    log::trace!("{} {}", hash, file.path.display());
                    FingerprintResult::hashed(file, hash)
                }
                Err(e) => FingerprintResult::failed(file, e),
            }
        };

        let pool = WorkerPool::spawn(
            jobs_rx,
            handler,
            &PoolConfig::new(self.config.workers()),
            &self.shutdown,
        )?;

        Ok(pool.filter(|result| !result.is_interrupted()))
    }

    /// Hash every file and collect the results.
    ///
    /// A per-file failure is recorded in that file's result. If shutdown is
    /// requested mid-run the outcome holds whatever finished and
    /// `stats.interrupted` is set.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] if the worker threads cannot be started.
    pub fn hash_files(&self, files: Vec<FileDescriptor>) -> Result<FingerprintOutcome, PoolError> {
        let mut stats = FingerprintStats {
            input_files: files.len(),
            ..Default::default()
        };

        if files.is_empty() {
            log::debug!("Hashing: no files to process");
            return Ok(FingerprintOutcome {
                results: Vec::new(),
                stats,
            });
        }

        log::info!(
            "Hashing {} files with {} using {} workers",
            files.len(),
            self.config.algorithm(),
            self.config.workers()
        );

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(PHASE_HASHING, files.len());
        }

        let hashers = Arc::new(HasherPool::new(
            self.config.algorithm(),
            self.config.workers(),
        ));
        let mut results = Vec::with_capacity(files.len());

        for result in self.spawn(files, Arc::clone(&hashers))? {
            match &result.outcome {
                Ok(_) => {
                    stats.hashed_files += 1;
                    stats.bytes_hashed += result.descriptor.size;
                }
                Err(e) => {
                    stats.failed_files += 1;
                    log::warn!("Failed to hash {}: {}", result.descriptor.path.display(), e);
                }
            }

            if let Some(ref callback) = self.progress_callback {
                callback.on_progress(
                    results.len() + 1,
                    result.descriptor.path.to_string_lossy().as_ref(),
                );
                callback.on_item_completed(result.descriptor.size);
            }
            results.push(result);
        }

        stats.accumulators_created = hashers.created();
        stats.interrupted =
            self.shutdown.is_shutdown_requested() && results.len() < stats.input_files;

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(PHASE_HASHING);
        }

        if stats.interrupted {
            log::info!(
                "Hashing interrupted: {} of {} files processed",
                results.len(),
                stats.input_files
            );
        } else {
            log::info!(
                "Hashing complete: {} hashed, {} failed, {} bytes",
                stats.hashed_files,
                stats.failed_files,
                stats.bytes_hashed
            );
        }

        Ok(FingerprintOutcome { results, stats })
    }
}

/// Stream one file through an accumulator from `hashers`.
///
/// # Errors
///
/// Returns a classified [`FingerprintError`] on I/O failure, or
/// [`FingerprintError::Interrupted`] if shutdown fires while reading.
pub fn hash_file(
    path: &Path,
    hashers: &HasherPool,
    shutdown: &ShutdownHandler,
) -> Result<String, FingerprintError> {
    let file = File::open(path).map_err(|e| FingerprintError::from_io(path.to_path_buf(), e))?;
    hash_reader(path, file, hashers, shutdown)
}

fn hash_reader<R: Read>(
    path: &Path,
    mut reader: R,
    hashers: &HasherPool,
    shutdown: &ShutdownHandler,
) -> Result<String, FingerprintError> {
    let mut acc = hashers.acquire();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(FingerprintError::from_io(path.to_path_buf(), e)),
        };
        acc.update(&buffer[..n]);

        if shutdown.is_shutdown_requested() {
            return Err(FingerprintError::Interrupted(path.to_path_buf()));
        }
    }

    Ok(hash_to_hex(&acc.finalize_reset()))
}
