//! CSV output formatter for duplicate scan results.
//!
//! One row per duplicate file, under a `hash,size,path` header, in the same
//! order as the plain listing.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::{DuplicateFinder, FinderConfig};
//! use dupfind::output::csv::CsvOutput;
//! use dupfind::signal::ShutdownHandler;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default(), ShutdownHandler::new());
//! let report = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! CsvOutput::new(&report).write_to(&mut std::io::stdout()).unwrap();
//! ```

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateReport;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    hash: &'a str,
    size: u64,
    path: String,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    report: &'a DuplicateReport,
}

impl<'a> CsvOutput<'a> {
    #[must_use]
    pub fn new(report: &'a DuplicateReport) -> Self {
        Self { report }
    }

    /// Write the CSV output to the given writer.
    ///
    /// A header row is written even when there are no duplicates.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(["hash", "size", "path"])?;

        for (hash, size, path) in self.report.entries() {
            csv_writer.serialize(CsvRow {
                hash,
                size,
                path: path.to_string_lossy().into_owned(),
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
