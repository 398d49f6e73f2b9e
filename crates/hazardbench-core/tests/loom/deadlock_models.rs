//! Loom models in which `read` races a writer and forms the circular wait.
//!
//! Loom reports the cycle as a `deadlock; threads = ..` panic. While that
//! panic unwinds, loom's `RwLock` guards panic again in their destructors and
//! the process aborts, so these models cannot run in-process next to the
//! others. They are `#[ignore]`d and driven from `loom_tests.rs` in a child
//! process that must die with the deadlock report on stderr.

use hazardbench_core::sync::{thread, Arc};
use hazardbench_core::{CacheTiming, DualLockCache};

fn cache() -> Arc<DualLockCache<u8>> {
    Arc::new(DualLockCache::with_timing(CacheTiming::uniform(
        std::time::Duration::from_millis(1),
    )))
}

#[test]
#[ignore = "aborts the process; run via test_loom_read_vs_invalidate_cycle_detected"]
fn read_vs_invalidate() {
    loom::model(|| {
        let cache = cache();
        cache.put("k", 1);

        let c1 = Arc::clone(&cache);
        let invalidator = thread::spawn(move || c1.invalidate("k"));

        let c2 = Arc::clone(&cache);
        let reader = thread::spawn(move || {
            let _ = c2.read("k");
        });

        invalidator.join().unwrap();
        reader.join().unwrap();
    });
}

#[test]
#[ignore = "aborts the process; run via test_loom_read_vs_put_cycle_detected"]
fn read_vs_put() {
    loom::model(|| {
        let cache = cache();

        let c1 = Arc::clone(&cache);
        let writer = thread::spawn(move || c1.put("k", 2));

        let c2 = Arc::clone(&cache);
        let reader = thread::spawn(move || {
            let _ = c2.read("k");
        });

        writer.join().unwrap();
        reader.join().unwrap();
    });
}
