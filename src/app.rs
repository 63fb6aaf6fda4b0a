//! Top-level run logic for the `dupfind` binary.

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use yansi::Paint;

use crate::actions::delete::{delete_duplicates, plan_deletions, DeleteConfig, DeleteError};
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, DuplicateReport, FinderConfig};
use crate::error::{ConfigError, ExitCode};
use crate::logging;
use crate::output::{write_diagnostics, write_report};
use crate::progress::Progress;
use crate::signal::{self, ShutdownHandler};

/// Run one scan as described by `cli`.
///
/// # Errors
///
/// Configuration errors, a missing or non-directory root, and output
/// failures. Per-file problems and interruption are not errors; they are
/// reflected in the returned [`ExitCode`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);
    if cli.no_color || !io::stderr().is_terminal() {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref())?;
    config.merge_cli(&cli);
    let fingerprint = config.fingerprint_config()?;
    let walker = config.walker_config()?;

    if cli.delete && !cli.yes && !io::stdin().is_terminal() {
        return Err(ConfigError::Invalid(
            "--delete needs --yes when stdin is not a terminal".to_string(),
        )
        .into());
    }

    let shutdown = signal::install_handler().unwrap_or_else(|e| {
        log::warn!("{e}; Ctrl+C will terminate without a partial report");
        ShutdownHandler::new()
    });

    log::debug!(
        "Scanning {} with {} x{}",
        cli.path.display(),
        fingerprint.algorithm(),
        fingerprint.workers()
    );

    let finder_config = FinderConfig::default()
        .with_fingerprint(fingerprint)
        .with_walker_config(walker)
        .with_progress_callback(Arc::new(Progress::new(cli.quiet)));
    let report = DuplicateFinder::new(finder_config, shutdown).find_duplicates(&cli.path)?;

    let mut exit_code = ExitCode::for_outcome(
        report.has_duplicates(),
        report.error_count(),
        report.is_partial(),
    );

    {
        let mut stdout = io::stdout().lock();
        write_report(&report, config.format, exit_code, &mut stdout)
            .context("failed to write results")?;
    }

    let mut stderr = io::stderr().lock();
    write_diagnostics(&report, &mut stderr)?;
    if !cli.quiet {
        write_summary(&report, &mut stderr)?;
    }

    if cli.delete && report.has_duplicates() {
        let delete_config = if cli.permanent {
            DeleteConfig::permanent()
        } else {
            DeleteConfig::trash()
        };
        let failed = run_deletion(&report, &delete_config, cli.yes, &mut stderr)?;
        if failed && exit_code == ExitCode::Success {
            exit_code = ExitCode::PartialSuccess;
        }
    }

    Ok(exit_code)
}

fn write_summary<W: Write>(report: &DuplicateReport, writer: &mut W) -> io::Result<()> {
    let summary = &report.summary;
    writeln!(
        writer,
        "{} {} files ({}) scanned, {} duplicate groups, {} reclaimable ({:.1}%) in {:.2?}",
        "summary:".bold(),
        summary.total_files,
        summary.total_size_display(),
        summary.duplicate_groups.green(),
        summary.reclaimable_display().green(),
        summary.wasted_percentage(),
        summary.scan_duration
    )
}

/// Returns true when any file could not be removed.
fn run_deletion<W: Write>(
    report: &DuplicateReport,
    config: &DeleteConfig,
    assume_yes: bool,
    stderr: &mut W,
) -> Result<bool> {
    let plans = plan_deletions(report);
    let count: usize = plans.iter().map(|plan| plan.remove.len()).sum();
    let bytes: u64 = plans
        .iter()
        .flat_map(|plan| plan.remove.iter().map(|f| f.size))
        .sum();
    let verb = if config.permanent {
        "Permanently delete"
    } else {
        "Move to trash"
    };
    let prompt = format!("{verb} {count} file(s) ({})?", bytesize::ByteSize::b(bytes));

    if !assume_yes {
        let stdin = io::stdin();
        if !confirm(&prompt, &mut stdin.lock(), stderr)? {
            writeln!(stderr, "Deletion cancelled")?;
            return Ok(false);
        }
    }

    match delete_duplicates(report, config) {
        Ok(result) => {
            for failure in &result.failures {
                writeln!(stderr, "{} {}", "delete failed:".red().bold(), failure)?;
            }
            writeln!(stderr, "{}", result.summary())?;
            Ok(!result.all_succeeded())
        }
        Err(DeleteError::PartialReport) => {
            writeln!(
                stderr,
                "{} {}",
                "warning:".red().bold(),
                DeleteError::PartialReport
            )?;
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Ask a yes/no question, defaulting to no.
fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> io::Result<bool> {
    loop {
        let mut line = String::new();
        write!(output, "{prompt} (y/N): ")?;
        output.flush()?;

        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "" | "n" | "no" => return Ok(false),
            _ => continue,
        }
    }
}
