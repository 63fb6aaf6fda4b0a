//! Content fingerprinting.
//!
//! - [`algorithm`]: the supported hash algorithms and their accumulators
//! - [`pool`]: a bounded pool of reusable accumulators, one per active worker
//! - [`engine`]: the concurrent engine that hashes a batch of files
//!
//! A [`FingerprintResult`] pairs each input descriptor with either its hex
//! digest or the error that prevented hashing it. Errors never abort the batch.

pub mod algorithm;
pub mod engine;
pub mod pool;

use std::path::PathBuf;

pub use algorithm::{hash_to_hex, Accumulator, HashAlgorithm};
pub use engine::{FingerprintEngine, FingerprintOutcome, FingerprintStats, CHUNK_SIZE};
pub use pool::{HasherPool, PooledAccumulator};

use crate::error::ConfigError;
use crate::scanner::FileDescriptor;

/// Why a single file could not be fingerprinted.
///
/// Messages leave out the path; callers print it next to the error.
#[derive(thiserror::Error, Debug)]
pub enum FingerprintError {
    /// The file vanished between enumeration and hashing.
    #[error("file not found")]
    NotFound(PathBuf),

    /// The file could not be opened or read due to permissions.
    #[error("permission denied")]
    PermissionDenied(PathBuf),

    /// Any other I/O failure.
    #[error("read failed: {source}")]
    Io {
        /// Path being hashed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing stopped because shutdown was requested.
    #[error("interrupted")]
    Interrupted(PathBuf),
}

impl FingerprintError {
    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::Io { path, .. } => path,
        }
    }

    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }
}

/// Outcome of fingerprinting one file.
#[derive(Debug)]
pub struct FingerprintResult {
    /// The file that was hashed.
    pub descriptor: FileDescriptor,
    /// Lowercase hex digest, or the reason there is none.
    pub outcome: Result<String, FingerprintError>,
}

impl FingerprintResult {
    /// Successful result.
    #[must_use]
    pub fn hashed(descriptor: FileDescriptor, hash: String) -> Self {
        Self {
            descriptor,
            outcome: Ok(hash),
        }
    }

    /// Failed result.
    #[must_use]
    pub fn failed(descriptor: FileDescriptor, error: FingerprintError) -> Self {
        Self {
            descriptor,
            outcome: Err(error),
        }
    }

    /// The digest, if hashing succeeded.
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    /// The error, if hashing failed.
    #[must_use]
    pub fn error(&self) -> Option<&FingerprintError> {
        self.outcome.as_ref().err()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self.outcome, Err(FingerprintError::Interrupted(_)))
    }
}

/// Engine settings, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintConfig {
    algorithm: HashAlgorithm,
    workers: usize,
}

impl FingerprintConfig {
    /// Build a config from a user-supplied algorithm name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownAlgorithm`] or [`ConfigError::ZeroWorkers`].
    pub fn new(algorithm: &str, workers: usize) -> Result<Self, ConfigError> {
        Self::from_parts(algorithm.parse()?, workers)
    }

    /// Build a config from an already parsed algorithm.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroWorkers`] if `workers` is 0.
    pub fn from_parts(algorithm: HashAlgorithm, workers: usize) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(Self { algorithm, workers })
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            workers: default_workers(),
        }
    }
}

/// Twice the available parallelism; hashing spends much of its time waiting on I/O.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new_validates() {
        let config = FingerprintConfig::new("md5", 3).unwrap();
        assert_eq!(config.algorithm(), HashAlgorithm::Md5);
        assert_eq!(config.workers(), 3);

        assert_eq!(
            FingerprintConfig::new("sha256", 0),
            Err(ConfigError::ZeroWorkers)
        );
        assert!(matches!(
            FingerprintConfig::new("crc32", 2),
            Err(ConfigError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn test_default_config() {
        let config = FingerprintConfig::default();
        assert_eq!(config.algorithm(), HashAlgorithm::Sha256);
        assert!(config.workers() >= 1);
    }

    #[test]
    fn test_result_accessors() {
        let ok = FingerprintResult::hashed(FileDescriptor::new("/a", 1), "ab".to_string());
        assert_eq!(ok.hash(), Some("ab"));
        assert!(ok.error().is_none());
        assert!(ok.is_ok());

        let err = FingerprintResult::failed(
            FileDescriptor::new("/b", 1),
            FingerprintError::NotFound(PathBuf::from("/b")),
        );
        assert!(err.hash().is_none());
        assert!(err.error().is_some());
        assert!(!err.is_interrupted());
    }

    #[test]
    fn test_error_from_io() {
        let err = FingerprintError::from_io(
            PathBuf::from("/x"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.to_string(), "permission denied");

        let err = FingerprintError::from_io(
            PathBuf::from("/y"),
            std::io::Error::other("disk on fire"),
        );
        assert!(matches!(err, FingerprintError::Io { .. }));
    }
}
