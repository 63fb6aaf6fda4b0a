//! Cooperative cancellation and Ctrl+C handling.
//!
//! [`ShutdownHandler`] is the single cancellation signal shared by the walker,
//! the worker pool and the fingerprint engine. It combines two views of the
//! same event:
//!
//! - an `AtomicBool` flag for cheap polling between read chunks, and
//! - a "done" channel that becomes disconnected on shutdown, so threads blocked
//!   in a `crossbeam_channel::select!` (waiting for a job, or waiting to deliver
//!   a result) wake up immediately.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupfind::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//!
//! // Pass clones of the handler to the finder / engine, then check it later
//! if handler.is_shutdown_requested() {
//!     eprintln!("Shutdown requested, results are partial");
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender};

/// Exit code for SIGINT (Ctrl+C) interruption (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown signal.
///
/// Cloning is cheap and every clone observes the same signal. Once requested,
/// a shutdown cannot be undone; create a new handler for a new run.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
    /// Dropped on shutdown, which disconnects `done`.
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    done: Receiver<()>,
}

impl ShutdownHandler {
    /// Create a new handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        let (trigger, done) = crossbeam_channel::bounded(0);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            trigger: Arc::new(Mutex::new(Some(trigger))),
            done,
        }
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown.
    ///
    /// Sets the flag and disconnects the done channel. Calling this more than
    /// once is harmless.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let sender = self
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
    }

    /// Receiver that never yields a message and becomes disconnected on shutdown.
    ///
    /// Meant for `select!`: a `recv` on it completes (with an error) exactly
    /// when shutdown has been requested.
    #[must_use]
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }

    /// Get a clone of the raw shutdown flag.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Install a Ctrl+C / SIGTERM handler that requests shutdown on interrupt.
///
/// Call once, early in the binary. The returned handler is the value to pass
/// to the finder; nothing is stored globally.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if a process-wide handler is
/// already registered.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let handler = ShutdownHandler::new();
    let hook = handler.clone();

    ctrlc::set_handler(move || {
        if !hook.is_shutdown_requested() {
            let _ = writeln!(
                std::io::stderr(),
                "\nInterrupted. Finishing in-flight files..."
            );
            let _ = std::io::stderr().flush();
            log::info!("Shutdown signal received");
        }
        hook.request_shutdown();
    })?;

    Ok(handler)
}
