//! Bounded pool of reusable hash accumulators.
//!
//! Workers [`acquire`](HasherPool::acquire) an accumulator per file and give it
//! back by dropping the returned guard. The pool creates accumulators lazily,
//! so with `n` workers it never holds more than `n` live instances no matter
//! how many files are hashed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::algorithm::{Accumulator, HashAlgorithm};

/// Acquire/release pool of accumulators for one algorithm.
pub struct HasherPool {
    algorithm: HashAlgorithm,
    capacity: usize,
    idle: Mutex<Vec<Box<dyn Accumulator>>>,
    in_use: AtomicUsize,
    created: AtomicUsize,
}

impl std::fmt::Debug for HasherPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HasherPool")
            .field("algorithm", &self.algorithm)
            .field("capacity", &self.capacity)
            .field("idle", &self.idle_count())
            .field("in_use", &self.in_use())
            .field("created", &self.created())
            .finish()
    }
}

impl HasherPool {
    /// Create an empty pool sized for `capacity` concurrent users.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, capacity: usize) -> Self {
        Self {
            algorithm,
            capacity: capacity.max(1),
            idle: Mutex::new(Vec::with_capacity(capacity)),
            in_use: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
        }
    }

    /// Algorithm every accumulator in this pool computes.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Take an idle accumulator, or create one if none is idle.
    ///
    /// The accumulator is in its initial state. It returns to the pool when
    /// the guard is dropped, on every exit path.
    pub fn acquire(&self) -> PooledAccumulator<'_> {
        let recycled = self.lock_idle().pop();
        let inner = recycled.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::SeqCst);
            log::trace!("HasherPool: creating {} accumulator", self.algorithm);
            self.algorithm.new_accumulator()
        });
        self.in_use.fetch_add(1, Ordering::SeqCst);

        PooledAccumulator {
            pool: self,
            inner: Some(inner),
        }
    }

    /// Accumulators currently checked out.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::SeqCst)
    }

    /// Accumulators waiting in the idle list.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.lock_idle().len()
    }

    /// Accumulators ever created by this pool.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn lock_idle(&self) -> MutexGuard<'_, Vec<Box<dyn Accumulator>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, mut acc: Box<dyn Accumulator>) {
        acc.reset();
        self.in_use.fetch_sub(1, Ordering::SeqCst);

        let mut idle = self.lock_idle();
        if idle.len() < self.capacity {
            idle.push(acc);
        }
    }
}

/// Accumulator checked out of a [`HasherPool`].
pub struct PooledAccumulator<'a> {
    pool: &'a HasherPool,
    inner: Option<Box<dyn Accumulator>>,
}

impl PooledAccumulator<'_> {
    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        if let Some(acc) = self.inner.as_mut() {
            acc.update(data);
        }
    }

    /// Digest of the bytes fed so far; the accumulator is reset afterwards.
    pub fn finalize_reset(&mut self) -> Vec<u8> {
        self.inner
            .as_mut()
            .map(|acc| acc.finalize_reset())
            .unwrap_or_default()
    }
}

impl Drop for PooledAccumulator<'_> {
    fn drop(&mut self) {
        if let Some(acc) = self.inner.take() {
            self.pool.release(acc);
        }
    }
}
