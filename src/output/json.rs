//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "b94d27b9...",
//!       "size": 11,
//!       "files": ["/path/to/a.txt", "/path/to/b.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "algorithm": "sha256",
//!     "total_files": 100,
//!     "duplicate_groups": 5,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     ...
//!   }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::duplicates::{DuplicateGroup, DuplicateReport, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Lowercase hex digest
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Paths of every copy, sorted
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash.clone(),
            size: group.size,
            files: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub algorithm: String,
    pub workers: usize,
    pub total_files: usize,
    pub total_size: u64,
    pub candidates: usize,
    pub hashed_files: usize,
    pub failed_files: usize,
    pub skipped_entries: usize,
    pub duplicate_groups: usize,
    pub duplicate_files: usize,
    /// Bytes held by redundant copies
    pub reclaimable_space: u64,
    pub scan_duration_ms: u64,
    pub interrupted: bool,
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g. "DF000")
    pub exit_code_name: String,
    pub generated_at: DateTime<Utc>,
}

impl JsonSummary {
    #[must_use]
    pub fn new(summary: &ScanSummary, skipped_entries: usize, exit_code: ExitCode) -> Self {
        Self {
            algorithm: summary.algorithm.to_string(),
            workers: summary.workers,
            total_files: summary.total_files,
            total_size: summary.total_size,
            candidates: summary.candidates,
            hashed_files: summary.hashed_files,
            failed_files: summary.failed_files,
            skipped_entries,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
            generated_at: Utc::now(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub duplicates: Vec<JsonDuplicateGroup>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON document for a finished report.
    #[must_use]
    pub fn new(report: &DuplicateReport, exit_code: ExitCode) -> Self {
        Self {
            duplicates: report.groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::new(&report.summary, report.scan_errors.len(), exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
