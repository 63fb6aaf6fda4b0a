//! Command-line interface definitions for dupfind.
//!
//! Every scan-shaping option is optional here so that an unset flag falls
//! through to the configuration file and environment (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Scan a directory with the default sha256 fingerprints
//! dupfind ~/Downloads
//!
//! # Fast fingerprints, JSON output
//! dupfind ~/Downloads --algo xxh3 --format json
//!
//! # Size and name filters
//! dupfind ~/Downloads --min-size 1MB --exclude-ext jpg,png --exclude-dir node_modules
//!
//! # Move redundant copies to the trash without prompting
//! dupfind ~/Downloads --delete -y
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Concurrent duplicate file finder.
///
/// Files are grouped by size, fingerprinted in parallel with the selected
/// hash algorithm, and every group of two or more identical files is listed.
#[derive(Debug, Parser)]
#[command(name = "dupfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Hash algorithm: xxh3, md5, sha1, sha256 or blake3 [default: sha256]
    #[arg(long, value_name = "ALGO")]
    pub algo: Option<String>,

    /// Number of hashing workers [default: available parallelism x 2]
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Minimum file size to consider (e.g., 0, 1KB, 1MB) [default: 1B]
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MB, 1GB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// File extensions to skip, comma-separated (can be repeated)
    #[arg(long, value_name = "LIST")]
    pub exclude_ext: Vec<String>,

    /// Directory names to skip with their contents, comma-separated (can be repeated)
    #[arg(long, value_name = "LIST")]
    pub exclude_dir: Vec<String>,

    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// These patterns are added to a .gitignore found at the scan root.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during scan
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Output format for the duplicate listing [default: plain]
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Remove every copy except the first of each group (by path)
    #[arg(long)]
    pub delete: bool,

    /// Use permanent deletion instead of moving to trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long, requires = "delete")]
    pub permanent: bool,

    /// Skip the deletion confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as a JSON document on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,
}

/// Flatten repeated comma-separated values.
///
/// Entries are trimmed and empty entries dropped.
///
/// ```
/// use dupfind::cli::split_list;
///
/// let raw = vec!["jpg, png".to_string(), ",gif,,".to_string()];
/// assert_eq!(split_list(&raw), vec!["jpg", "png", "gif"]);
/// ```
#[must_use]
pub fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes. Every unit
/// is 1024-based, so `KB` and `KiB` are the same size.
///
/// # Examples
///
/// ```
/// use dupfind::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1024);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_048_576);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" | "KIB" => 1 << 10,
        "MB" | "M" | "MIB" => 1 << 20,
        "GB" | "G" | "GIB" => 1 << 30,
        "TB" | "T" | "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
