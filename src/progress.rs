//! Progress reporting using indicatif.
//!
//! [`ProgressCallback`] is the hook the walker and the fingerprint engine call
//! into. [`Progress`] implements it with a spinner for the walking phase and
//! a byte-throughput bar for the hashing phase. Bars draw to stderr and are
//! hidden entirely in quiet mode or when stderr is not a terminal.

use std::io::IsTerminal;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Phase name reported while walking the directory tree.
pub const PHASE_WALKING: &str = "walking";
/// Phase name reported while fingerprinting candidates.
pub const PHASE_HASHING: &str = "hashing";

/// Progress callback for the stages of a duplicate scan.
///
/// Implementations must be cheap: `on_progress` and `on_item_completed` are
/// called from the collector thread once per file.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts with the number of items it will process
    /// (`0` if unknown, as for walking).
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed. `current` is 1-based.
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed, with its size in bytes.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<Hashing>>,
    enabled: bool,
}

struct Hashing {
    bar: ProgressBar,
    files_done: usize,
    files_total: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// Nothing is drawn when `quiet` is set or stderr is not a terminal.
    ///
    /// ```
    /// use dupfind::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// assert!(!progress.is_enabled());
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let enabled = !quiet && std::io::stderr().is_terminal();
        let multi = if enabled {
            MultiProgress::with_draw_target(ProgressDrawTarget::stderr())
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self {
            multi,
            walking: Mutex::new(None),
            hashing: Mutex::new(None),
            enabled,
        }
    }

    /// Whether bars are actually drawn.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn hashing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {bytes}/{total_bytes} {msg} {bytes_per_sec} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if !self.enabled {
            return;
        }

        match phase {
            PHASE_WALKING => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directory");
                pb.enable_steady_tick(Duration::from_millis(100));
                *lock(&self.walking) = Some(pb);
            }
            PHASE_HASHING => {
                // Length is in bytes; it grows as files complete, see on_item_completed.
                let pb = self.multi.add(ProgressBar::new(0));
                pb.set_style(Self::hashing_style());
                pb.set_message(format!("0/{total} files"));
                *lock(&self.hashing) = Some(Hashing {
                    bar: pb,
                    files_done: 0,
                    files_total: total,
                });
            }
            _ => {}
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if !self.enabled {
            return;
        }

        if let Some(ref pb) = *lock(&self.walking) {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        if !self.enabled {
            return;
        }

        if let Some(ref mut hashing) = *lock(&self.hashing) {
            hashing.files_done += 1;
            hashing.bar.inc_length(bytes);
            hashing.bar.inc(bytes);
            hashing
                .bar
                .set_message(format!("{}/{} files", hashing.files_done, hashing.files_total));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if !self.enabled {
            return;
        }

        match phase {
            PHASE_WALKING => {
                if let Some(pb) = lock(&self.walking).take() {
                    pb.finish_with_message("Walking complete");
                }
            }
            PHASE_HASHING => {
                if let Some(hashing) = lock(&self.hashing).take() {
                    hashing.bar.finish_with_message("Hashing complete");
                }
            }
            _ => {}
        }
    }

    fn on_message(&self, message: &str) {
        if !self.enabled {
            return;
        }

        if let Some(ref hashing) = *lock(&self.hashing) {
            hashing.bar.set_message(message.to_string());
        } else if let Some(ref pb) = *lock(&self.walking) {
            pb.set_message(message.to_string());
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
