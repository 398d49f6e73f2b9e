//! Dual-lock cache hazard scenario.
//!
//! # Thread-Safety & Lock Ordering
//!
//! All operations are thread-safe via two `RwLock`s, but there is **no global
//! lock hierarchy**:
//!
//! - writers (`put`, `invalidate`): `lock_a` then `lock_b`
//! - readers (`read`): `lock_b` then `lock_a`
//!
//! Same-order callers (any mix of writers, or any mix of readers) never form a
//! cycle. A reader racing a writer can deadlock. That asymmetry is the point
//! of this module and must stay.

mod dual_lock;

pub use dual_lock::{CacheStats, CacheTiming, DualLockCache};
