//! Dual-lock cache with an asymmetric lock acquisition order.
//!
//! Every operation holds both locks while it touches the store. `lock_b` owns
//! the map, `lock_a` is a data-less gate; neither lock alone is enough to see
//! a consistent store.
//!
//! | operation    | first            | second           |
//! |--------------|------------------|------------------|
//! | `put`        | `lock_a` (write) | `lock_b` (write) |
//! | `invalidate` | `lock_a` (write) | `lock_b` (write) |
//! | `read`       | `lock_b` (read)  | `lock_a` (read)  |
//!
//! A `read` racing a `put`/`invalidate` can end up holding `lock_b` while the
//! writer holds `lock_a`. Each then waits on the other forever.

#![allow(clippy::cast_precision_loss)] // Precision loss acceptable for hit rate calculation

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::sync::{self, AtomicU64, Ordering, RwLock};

/// Delays inserted between the first and second lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTiming {
    /// Gap used by `read` and `invalidate` while holding their first lock.
    pub acquire_delay: Duration,
    /// Gap used by `put` while holding `lock_a`.
    pub put_delay: Duration,
}

impl CacheTiming {
    /// No delays at all. Useful for single-threaded callers.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            acquire_delay: Duration::ZERO,
            put_delay: Duration::ZERO,
        }
    }

    /// Same gap for every operation, `put` included.
    #[must_use]
    pub const fn uniform(delay: Duration) -> Self {
        Self {
            acquire_delay: delay,
            put_delay: delay,
        }
    }
}

impl Default for CacheTiming {
    fn default() -> Self {
        Self {
            acquire_delay: Duration::from_millis(100),
            put_delay: Duration::ZERO,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Completed `put` calls.
    pub puts: u64,
    /// Completed `invalidate` calls.
    pub invalidations: u64,
    /// Completed `read` calls.
    pub reads: u64,
    /// Reads that found a value.
    pub hits: u64,
    /// Reads that found nothing.
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Key/value store guarded by two read/write locks taken in inconsistent order.
pub struct DualLockCache<V> {
    /// Gate lock. Taken first by writers, second by readers.
    lock_a: RwLock<()>,
    /// Owns the store. Taken first by readers, second by writers.
    lock_b: RwLock<FxHashMap<String, V>>,
    timing: CacheTiming,
    /// Statistics (atomic for lock-free reads).
    puts: AtomicU64,
    invalidations: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> DualLockCache<V> {
    /// Create an empty cache with the default 100 ms acquisition gap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timing(CacheTiming::default())
    }

    /// Create an empty cache with explicit delays.
    #[must_use]
    pub fn with_timing(timing: CacheTiming) -> Self {
        Self {
            lock_a: RwLock::new(()),
            lock_b: RwLock::new(FxHashMap::default()),
            timing,
            puts: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Delays this cache inserts between acquisitions.
    #[must_use]
    pub fn timing(&self) -> CacheTiming {
        self.timing
    }

    /// Store `value` at `key`, replacing any previous value.
    ///
    /// Lock order: `lock_a` write, then `lock_b` write.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();

        let gate = sync::write(&self.lock_a);
        debug!(thread = %sync::thread_name(), op = "put", "acquired lock_a");
        sync::pause(self.timing.put_delay);

        let mut store = sync::write(&self.lock_b);
        debug!(thread = %sync::thread_name(), op = "put", "acquired lock_b");
        store.insert(key.clone(), value);
        debug!(key = %key, "added key");

        drop(store);
        drop(gate);
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove `key` if present. Absent keys are a no-op.
    ///
    /// Lock order: `lock_a` write, then `lock_b` write.
    pub fn invalidate(&self, key: &str) {
        let gate = sync::write(&self.lock_a);
        debug!(thread = %sync::thread_name(), op = "invalidate", "acquired lock_a");
        sync::pause(self.timing.acquire_delay);

        let mut store = sync::write(&self.lock_b);
        debug!(thread = %sync::thread_name(), op = "invalidate", "acquired lock_b");
        let removed = store.remove(key).is_some();
        debug!(key, removed, "invalidated key");

        drop(store);
        drop(gate);
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Current number of entries.
    ///
    /// Takes both locks shared, in the writer order (`lock_a`, then `lock_b`).
    #[must_use]
    pub fn len(&self) -> usize {
        let gate = sync::read(&self.lock_a);
        let store = sync::read(&self.lock_b);
        let len = store.len();
        drop(store);
        drop(gate);
        len
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            puts: self.puts.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            reads: hits + misses,
            hits,
            misses,
        }
    }
}

impl<V: Clone> DualLockCache<V> {
    /// Look up `key`.
    ///
    /// Lock order: `lock_b` read, then `lock_a` read. This is the reverse of
    /// the writers and is what makes the cycle possible.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<V> {
        let store = sync::read(&self.lock_b);
        debug!(thread = %sync::thread_name(), op = "read", "acquired lock_b");
        sync::pause(self.timing.acquire_delay);

        let gate = sync::read(&self.lock_a);
        debug!(thread = %sync::thread_name(), op = "read", "acquired lock_a");
        let value = store.get(key).cloned();
        debug!(key, found = value.is_some(), "read value");

        drop(gate);
        drop(store);

        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }
}

impl<V> Default for DualLockCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
