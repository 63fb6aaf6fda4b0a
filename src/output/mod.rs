//! Output formatters for duplicate scan results.
//!
//! - plain: `hash<TAB>size<TAB>path`, one duplicate per line
//! - paths: one duplicate path per line
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! Results always go to the writer handed to [`write_report`] (stdout in the
//! binary). Errors go through [`write_diagnostics`] to a separate writer so
//! they never mix with the listing.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::{DuplicateFinder, FinderConfig};
//! use dupfind::error::ExitCode;
//! use dupfind::output::{write_diagnostics, write_report, OutputFormat};
//! use dupfind::signal::ShutdownHandler;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default(), ShutdownHandler::new());
//! let report = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! write_report(&report, OutputFormat::Plain, ExitCode::Success, &mut std::io::stdout()).unwrap();
//! write_diagnostics(&report, &mut std::io::stderr()).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod plain;

use std::io::Write;

use serde::{Deserialize, Serialize};
use yansi::Paint;

pub use csv::CsvOutput;
pub use json::JsonOutput;

use crate::duplicates::DuplicateReport;
use crate::error::ExitCode;

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated `hash size path` lines
    #[default]
    Plain,
    /// Duplicate paths only
    Paths,
    /// JSON document for scripting
    Json,
    /// CSV with a `hash,size,path` header
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Plain => "plain",
            Self::Paths => "paths",
            Self::Json => "json",
            Self::Csv => "csv",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while writing results.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] json::JsonOutputError),

    #[error(transparent)]
    Csv(#[from] csv::CsvOutputError),
}

/// Write the duplicate listing in `format`.
///
/// # Errors
///
/// Returns [`OutputError`] if serialization or writing fails.
pub fn write_report<W: Write>(
    report: &DuplicateReport,
    format: OutputFormat,
    exit_code: ExitCode,
    writer: &mut W,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Plain => plain::write_plain(report, writer)?,
        OutputFormat::Paths => plain::write_paths(report, writer)?,
        OutputFormat::Json => JsonOutput::new(report, exit_code).write_to(writer, true)?,
        OutputFormat::Csv => CsvOutput::new(report).write_to(writer)?,
    }
    writer.flush()?;
    Ok(())
}

/// Write one line per skipped file and unreadable entry.
///
/// Lines read `skip <path>: <reason>`, sorted by path.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_diagnostics<W: Write>(report: &DuplicateReport, writer: &mut W) -> std::io::Result<()> {
    let mut lines: Vec<(String, String)> = report
        .errors
        .iter()
        .filter_map(|result| {
            result.error().map(|e| {
                (
                    result.descriptor.path.display().to_string(),
                    e.to_string(),
                )
            })
        })
        .chain(
            report
                .scan_errors
                .iter()
                .map(|e| (e.path().display().to_string(), scan_reason(e))),
        )
        .collect();
    lines.sort();

    for (path, reason) in lines {
        writeln!(writer, "{} {}: {}", "skip".yellow().bold(), path, reason)?;
    }

    if report.is_partial() {
        writeln!(
            writer,
            "{} scan interrupted, results are partial",
            "warning:".red().bold()
        )?;
    }
    Ok(())
}

fn scan_reason(err: &crate::scanner::ScanError) -> String {
    use crate::scanner::ScanError;

    match err {
        ScanError::PermissionDenied(_) => "permission denied".to_string(),
        ScanError::NotFound(_) => "not found".to_string(),
        ScanError::Io { source, .. } => source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::DuplicateGroup;
    use crate::fingerprint::{FingerprintError, FingerprintResult};
    use crate::scanner::{FileDescriptor, ScanError};
    use std::path::PathBuf;

    fn report_with_errors() -> DuplicateReport {
        DuplicateReport {
            groups: vec![DuplicateGroup::new(
                "aa".into(),
                3,
                vec![FileDescriptor::new("/d/1", 3), FileDescriptor::new("/d/2", 3)],
            )],
            errors: vec![FingerprintResult::failed(
                FileDescriptor::new("/d/locked", 3),
                FingerprintError::PermissionDenied(PathBuf::from("/d/locked")),
            )],
            scan_errors: vec![ScanError::NotFound(PathBuf::from("/d/gone"))],
            ..Default::default()
        }
    }

    #[test]
    fn test_write_diagnostics_lists_every_error() {
        yansi::disable();
        let mut out = Vec::new();
        write_diagnostics(&report_with_errors(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "skip /d/gone: not found\nskip /d/locked: permission denied\n"
        );
    }

    #[test]
    fn test_write_diagnostics_never_mentions_duplicates() {
        yansi::disable();
        let mut out = Vec::new();
        write_diagnostics(&report_with_errors(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(!text.contains("/d/1"));
        assert!(!text.contains("/d/2"));
    }

    #[test]
    fn test_write_report_plain_excludes_errors() {
        let mut out = Vec::new();
        write_report(
            &report_with_errors(),
            OutputFormat::Plain,
            ExitCode::PartialSuccess,
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, "aa\t3\t/d/1\naa\t3\t/d/2\n");
    }

    #[test]
    fn test_write_report_csv_then_flushes() {
        let mut out = Vec::new();
        write_report(
            &report_with_errors(),
            OutputFormat::Csv,
            ExitCode::PartialSuccess,
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text, "hash,size,path\naa,3,/d/1\naa,3,/d/2\n");
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Plain.to_string(), "plain");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }
}
