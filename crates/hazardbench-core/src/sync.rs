//! Synchronization primitives with loom support for concurrency testing.
//!
//! This module provides type aliases that switch between production sync
//! primitives and loom's mocked versions based on the `loom` cfg flag, plus a
//! few helpers that paper over the API differences (parking_lot guards are
//! returned directly, loom guards come wrapped in a `LockResult`).
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::sync::{self, Arc, RwLock};
//!
//! let data = Arc::new(RwLock::new(42));
//! let guard = sync::read(&data);
//! ```
//!
//! # Testing with Loom
//!
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test --features loom --test loom_tests
//! ```

use std::time::Duration;

// ============================================================================
// Arc
// ============================================================================

#[cfg(loom)]
pub use loom::sync::Arc;

#[cfg(not(loom))]
pub use std::sync::Arc;

// ============================================================================
// Mutex / RwLock (parking_lot in production, loom under the model checker)
// ============================================================================

#[cfg(loom)]
pub use loom::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(not(loom))]
pub use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

// ============================================================================
// Atomics
// ============================================================================

#[cfg(loom)]
pub use loom::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[cfg(not(loom))]
pub use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// ============================================================================
// Thread spawning (for loom tests)
// ============================================================================

#[cfg(loom)]
pub use loom::thread;

#[cfg(not(loom))]
pub use std::thread;

// ============================================================================
// Guard helpers
// ============================================================================

/// Acquires `lock` in shared mode, blocking until it is available.
#[cfg(not(loom))]
pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read()
}

/// Acquires `lock` in shared mode, blocking until it is available.
#[cfg(loom)]
pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Acquires `lock` in exclusive mode, blocking until it is available.
#[cfg(not(loom))]
pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write()
}

/// Acquires `lock` in exclusive mode, blocking until it is available.
#[cfg(loom)]
pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Enters the critical section guarded by `mutex`.
#[cfg(not(loom))]
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock()
}

/// Enters the critical section guarded by `mutex`.
#[cfg(loom)]
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ============================================================================
// Interleaving delays
// ============================================================================

/// Sleeps for `delay` to widen the interleaving window.
///
/// Under loom there is no wall clock; the delay becomes a yield so the model
/// checker gets a scheduling point at the same spot.
#[cfg(not(loom))]
pub fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

/// Sleeps for `delay` to widen the interleaving window.
///
/// Under loom there is no wall clock; the delay becomes a yield so the model
/// checker gets a scheduling point at the same spot.
#[cfg(loom)]
pub fn pause(_delay: Duration) {
    loom::thread::yield_now();
}

/// Name of the calling thread, or `"unnamed"`.
#[cfg(not(loom))]
pub fn thread_name() -> String {
    std::thread::current()
        .name()
        .unwrap_or("unnamed")
        .to_string()
}

/// Name of the calling model thread, or its loom id.
///
/// Every loom thread runs on the test's OS thread, so the OS thread name says
/// nothing here. Must be called from inside a model.
#[cfg(loom)]
pub fn thread_name() -> String {
    let current = loom::thread::current();
    current
        .name()
        .map_or_else(|| format!("{:?}", current.id()), str::to_string)
}
