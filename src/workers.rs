//! Fixed-size worker pool with an unordered completion stream.
//!
//! [`WorkerPool::spawn`] starts exactly `workers` long-running tasks on a
//! dedicated rayon thread pool. Every task pulls jobs from a shared crossbeam
//! receiver, runs the handler, and sends the result into a single bounded
//! completion channel. The pool itself is the consuming end: iterate it to
//! read results as they finish. Iteration ends once every worker has exited.
//!
//! Shutdown is observed while waiting for a job and while waiting to deliver a
//! result, so a consumer that stops reading never leaves a worker stuck.
//!
//! # Example
//!
//! ```
//! use dupfind::signal::ShutdownHandler;
//! use dupfind::workers::{PoolConfig, WorkerPool};
//!
//! let (tx, rx) = crossbeam_channel::unbounded();
//! for n in 1..=10u64 {
//!     tx.send(n).unwrap();
//! }
//! drop(tx);
//!
//! let config = PoolConfig::new(3);
//! let pool = WorkerPool::spawn(rx, |n| n * n, &config, &ShutdownHandler::new()).unwrap();
//! let total: u64 = pool.sum();
//! assert_eq!(total, 385);
//! ```

use std::sync::Arc;

use crossbeam_channel::{select, Receiver, Sender};

use crate::signal::ShutdownHandler;

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of concurrent workers, at least 1.
    pub workers: usize,
    /// Completion channel capacity. `0` makes every delivery a rendezvous with
    /// the consumer.
    pub result_capacity: usize,
}

impl PoolConfig {
    /// Config with `workers` workers and a rendezvous completion channel.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            result_capacity: 0,
        }
    }

    /// Set the completion channel capacity.
    #[must_use]
    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity;
        self
    }
}

/// Errors starting a worker pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// A pool needs at least one worker.
    #[error("worker pool needs at least one worker")]
    ZeroWorkers,

    /// The underlying thread pool could not be created.
    #[error("failed to build worker thread pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

/// Running pool; iterate it to receive results in completion order.
pub struct WorkerPool<R> {
    results: Receiver<R>,
    workers: usize,
    // Owns the threads; dropping it lets them wind down once workers return.
    _threads: rayon::ThreadPool,
}

impl<R> std::fmt::Debug for WorkerPool<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("pending_results", &self.results.len())
            .finish()
    }
}

impl<R: Send + 'static> WorkerPool<R> {
    /// Start `config.workers` workers over `jobs`.
    ///
    /// The caller closes the job source by dropping every sender; workers exit
    /// when it is drained or when `shutdown` fires.
    ///
    /// # Errors
    ///
    /// [`PoolError::ZeroWorkers`] for an empty pool, [`PoolError::Build`] if
    /// the threads cannot be started.
    pub fn spawn<T, F>(
        jobs: Receiver<T>,
        handler: F,
        config: &PoolConfig,
        shutdown: &ShutdownHandler,
    ) -> Result<Self, PoolError>
    where
        T: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        if config.workers == 0 {
            return Err(PoolError::ZeroWorkers);
        }

        let threads = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("dupfind-worker-{i}"))
            .build()?;

        let (results_tx, results_rx) = crossbeam_channel::bounded(config.result_capacity);
        let handler = Arc::new(handler);

        for id in 0..config.workers {
            let jobs = jobs.clone();
            let results = results_tx.clone();
            let handler = Arc::clone(&handler);
            let shutdown = shutdown.clone();
            threads.spawn(move || worker_loop(id, &jobs, &results, handler.as_ref(), &shutdown));
        }
        // Workers hold the only senders now, so the stream closes when the last one exits.
        drop(results_tx);

        log::debug!("WorkerPool: started {} workers", config.workers);

        Ok(Self {
            results: results_rx,
            workers: config.workers,
            _threads: threads,
        })
    }
}

impl<R> WorkerPool<R> {
    /// Number of workers in the pool.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl<R> Iterator for WorkerPool<R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        self.results.recv().ok()
    }
}

fn worker_loop<T, R, F>(
    id: usize,
    jobs: &Receiver<T>,
    results: &Sender<R>,
    handler: &F,
    shutdown: &ShutdownHandler,
) where
    F: Fn(T) -> R,
{
    let mut handled = 0usize;

    loop {
        if shutdown.is_shutdown_requested() {
            break;
        }

        let job = select! {
            recv(jobs) -> job => match job {
                Ok(job) => job,
                Err(_) => break,
            },
            recv(shutdown.done()) -> _ => break,
        };

        let result = handler(job);
        handled += 1;

        if shutdown.is_shutdown_requested() {
            break;
        }

        select! {
            send(results, result) -> sent => {
                if sent.is_err() {
                    // Consumer went away.
                    break;
                }
            },
            recv(shutdown.done()) -> _ => break,
        }
    }

    log::trace!("WorkerPool: worker {} exiting after {} jobs", id, handled);
}
