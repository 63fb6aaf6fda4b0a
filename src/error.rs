//! Structured error handling, configuration errors and exit codes.

use serde::Serialize;

/// Errors detected while validating configuration, before any file is opened.
///
/// Every variant is fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The hash algorithm name is not one of the supported selectors.
    #[error("unknown hash algorithm '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownAlgorithm {
        /// The name as given by the user
        name: String,
        /// Closest supported name, if any is close enough
        suggestion: Option<&'static str>,
    },

    /// The worker count was zero.
    #[error("workers must be > 0")]
    ZeroWorkers,

    /// A human-readable size string could not be parsed.
    #[error("invalid size '{input}': {reason}")]
    InvalidSize {
        /// The rejected input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// The configuration file or environment could not be merged.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn suggestion_suffix(suggestion: &Option<&'static str>) -> String {
    suggestion
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Exit codes for the dupfind binary.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (configuration or unexpected failure)
/// - 2: No duplicates found
/// - 3: Partial success (some files could not be read or hashed)
/// - 130: Interrupted by user (Ctrl+C), results truncated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed and duplicates were found.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Scan completed but some files were skipped because of errors.
    PartialSuccess = 3,
    /// Scan was interrupted by a shutdown signal.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DF000",
            Self::GeneralError => "DF001",
            Self::NoDuplicates => "DF002",
            Self::PartialSuccess => "DF003",
            Self::Interrupted => "DF130",
        }
    }

    /// Pick the exit code that describes a finished run.
    ///
    /// Interruption wins over errors, errors win over the duplicate count.
    #[must_use]
    pub fn for_outcome(has_duplicates: bool, error_count: usize, interrupted: bool) -> Self {
        if interrupted {
            Self::Interrupted
        } else if error_count > 0 {
            Self::PartialSuccess
        } else if has_duplicates {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
