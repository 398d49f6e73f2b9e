//! Scenario drivers: spawn concurrent callers, join them with a deadline and
//! report whether everybody finished.
//!
//! A thread that misses the deadline is never interrupted. In the lock-order
//! scenario it is blocked on a lock and nothing can wake it, so its handle is
//! dropped (detaching it) and it stays blocked until the process exits. The
//! caller only learns its name through [`JoinOutcome::TimedOut`].

use std::any::Any;
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheTiming, DualLockCache};
use crate::error::{Error, Result};
use crate::queue::{
    CancelToken, Consumer, ConsumerReport, FlagGatedQueue, Producer, ProducerReport,
    QueueSnapshot, QueueTiming,
};

/// How a bounded join ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JoinOutcome {
    /// Every thread reported completion before the deadline.
    Completed {
        /// Time from the start of the join until the last thread reported.
        elapsed: Duration,
    },
    /// At least one thread was still running at the deadline.
    TimedOut {
        /// Names of the threads that never reported.
        stuck: Vec<String>,
    },
}

impl JoinOutcome {
    /// True when every thread finished in time.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Threads still running at the deadline (empty when completed).
    #[must_use]
    pub fn stuck(&self) -> &[String] {
        match self {
            Self::Completed { .. } => &[],
            Self::TimedOut { stuck } => stuck,
        }
    }

    /// Turn a timeout into [`Error::HazardDetected`] for `scenario`.
    ///
    /// # Errors
    ///
    /// Returns `HazardDetected` when the join timed out.
    pub fn into_result(self, scenario: &str) -> Result<Duration> {
        match self {
            Self::Completed { elapsed } => Ok(elapsed),
            Self::TimedOut { stuck } => Err(Error::HazardDetected {
                scenario: scenario.to_string(),
                stuck,
            }),
        }
    }
}

/// Value produced by a watched thread, available once it has been joined.
pub struct Slot<T> {
    value: Arc<Mutex<Option<T>>>,
}

impl<T> Slot<T> {
    /// Take the value out. `None` if the thread has not finished.
    #[must_use]
    pub fn take(&self) -> Option<T> {
        self.value.lock().take()
    }
}

/// Reports completion on the group channel when dropped, including while
/// unwinding from a panic.
struct DoneSignal {
    index: usize,
    done: Sender<usize>,
}

impl Drop for DoneSignal {
    fn drop(&mut self) {
        let _ = self.done.send(self.index);
    }
}

/// Named threads joined together under one deadline.
pub struct ThreadGroup {
    done_tx: Sender<usize>,
    done_rx: Receiver<usize>,
    members: Vec<(String, JoinHandle<()>)>,
}

impl ThreadGroup {
    /// An empty group.
    #[must_use]
    pub fn new() -> Self {
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        Self {
            done_tx,
            done_rx,
            members: Vec::new(),
        }
    }

    /// Number of threads spawned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if nothing has been spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Spawn `f` on a new thread called `name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Spawn` if the OS refuses to create the thread.
    pub fn spawn<T, F>(&mut self, name: impl Into<String>, f: F) -> Result<Slot<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let name = name.into();
        let value = Arc::new(Mutex::new(None));
        let slot = Slot {
            value: Arc::clone(&value),
        };
        let signal = DoneSignal {
            index: self.members.len(),
            done: self.done_tx.clone(),
        };

        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            let _signal = signal;
            let out = f();
            *value.lock() = Some(out);
        })?;

        self.members.push((name, handle));
        Ok(slot)
    }

    /// Wait until every member finished or `timeout` elapsed.
    ///
    /// Finished members are joined; members that missed the deadline are
    /// detached and listed in [`JoinOutcome::TimedOut`].
    ///
    /// # Errors
    ///
    /// Returns `Error::ThreadPanicked` if a finished member panicked.
    pub fn join_within(self, timeout: Duration) -> Result<JoinOutcome> {
        let Self {
            done_tx,
            done_rx,
            members,
        } = self;
        drop(done_tx);

        let started = Instant::now();
        let deadline = started + timeout;
        let mut finished = vec![false; members.len()];
        let mut remaining = members.len();

        while remaining > 0 {
            match done_rx.recv_deadline(deadline) {
                Ok(index) => {
                    if !finished[index] {
                        finished[index] = true;
                        remaining -= 1;
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        let elapsed = started.elapsed();

        let mut stuck = Vec::new();
        for ((name, handle), done) in members.into_iter().zip(finished) {
            if done {
                handle
                    .join()
                    .map_err(|payload| Error::ThreadPanicked(panic_message(&name, &*payload)))?;
            } else {
                stuck.push(name);
            }
        }

        if stuck.is_empty() {
            debug!(?elapsed, "all threads completed");
            Ok(JoinOutcome::Completed { elapsed })
        } else {
            warn!(?timeout, stuck = ?stuck, "threads did not complete before the deadline");
            Ok(JoinOutcome::TimedOut { stuck })
        }
    }
}

impl Default for ThreadGroup {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(name: &str, payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    format!("{name}: {detail}")
}

// ============================================================================
// Lock-order scenario
// ============================================================================

/// Write-side operation raced against `read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriterOp {
    /// `invalidate(key)`.
    #[default]
    Invalidate,
    /// `put(key, value)`.
    Put,
}

impl WriterOp {
    fn label(self) -> &'static str {
        match self {
            Self::Invalidate => "invalidator",
            Self::Put => "writer",
        }
    }
}

/// One reader against one writer on the same key, released together.
///
/// The key is seeded first so the reader has something to find. On a
/// timeout both threads are left blocked holding their first lock. Those
/// locks are never released, so the cache is unusable afterwards.
///
/// # Errors
///
/// Returns `Error::Spawn` or `Error::ThreadPanicked` on harness failure. A
/// deadlock is **not** an error here; it is `JoinOutcome::TimedOut`.
pub fn lock_order_trial(
    cache: &Arc<DualLockCache<String>>,
    key: &str,
    writer: WriterOp,
    timeout: Duration,
) -> Result<JoinOutcome> {
    cache.put(key, "seed".to_string());

    let start = Arc::new(Barrier::new(2));
    let mut group = ThreadGroup::new();

    let (c, b, k) = (Arc::clone(cache), Arc::clone(&start), key.to_string());
    group.spawn(writer.label(), move || {
        b.wait();
        match writer {
            WriterOp::Invalidate => c.invalidate(&k),
            WriterOp::Put => c.put(k, "overwritten".to_string()),
        }
    })?;

    let (c, b, k) = (Arc::clone(cache), Arc::clone(&start), key.to_string());
    group.spawn("reader", move || {
        b.wait();
        let _ = c.read(&k);
    })?;

    group.join_within(timeout)
}

/// Result of repeated lock-order trials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignReport {
    /// Write-side operation that was raced against `read`.
    pub writer: WriterOp,
    /// Trials run.
    pub trials: u32,
    /// Trials where both threads finished.
    pub completed: u32,
    /// Trials that hit the deadline.
    pub deadlocked: u32,
}

impl CampaignReport {
    /// True if at least one trial formed the cycle.
    #[must_use]
    pub fn hazard_observed(&self) -> bool {
        self.deadlocked > 0
    }
}

/// Run `trials` independent lock-order trials, each on a fresh cache.
///
/// # Errors
///
/// Propagates harness failures from [`lock_order_trial`].
pub fn lock_order_campaign(
    trials: u32,
    timing: CacheTiming,
    writer: WriterOp,
    timeout: Duration,
) -> Result<CampaignReport> {
    let mut report = CampaignReport {
        writer,
        trials,
        ..CampaignReport::default()
    };

    for trial in 0..trials {
        let cache = Arc::new(DualLockCache::with_timing(timing));
        let outcome = lock_order_trial(&cache, "testKey", writer, timeout)?;
        if outcome.is_completed() {
            report.completed += 1;
        } else {
            warn!(trial, stuck = ?outcome.stuck(), "circular wait between read and {}", writer.label());
            report.deadlocked += 1;
        }
    }

    info!(
        trials,
        deadlocked = report.deadlocked,
        completed = report.completed,
        "lock-order campaign finished"
    );
    Ok(report)
}

/// Write-side callers only, on disjoint key ranges: `put` on `key0..keyN`
/// from one thread and `invalidate` on `keyN..key2N` from another.
///
/// All callers share one acquisition order, so no cycle is possible.
///
/// # Errors
///
/// Returns `Error::Spawn` or `Error::ThreadPanicked` on harness failure.
pub fn disjoint_writers(
    cache: &Arc<DualLockCache<String>>,
    keys: usize,
    timeout: Duration,
) -> Result<JoinOutcome> {
    let mut group = ThreadGroup::new();

    let c = Arc::clone(cache);
    group.spawn("putter", move || {
        for i in 0..keys {
            c.put(format!("key{i}"), format!("value{i}"));
        }
    })?;

    let c = Arc::clone(cache);
    group.spawn("invalidator", move || {
        for i in keys..keys * 2 {
            c.invalidate(&format!("key{i}"));
        }
    })?;

    group.join_within(timeout)
}

// ============================================================================
// Handoff scenario
// ============================================================================

/// Result of one producer/consumer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandoffReport {
    /// What the producer did.
    pub producer: ProducerReport,
    /// What the consumer processed before cancellation.
    pub consumer: ConsumerReport,
    /// Queue state after the consumer stopped.
    pub residual: QueueSnapshot,
}

/// Parameters for [`handoff_run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffPlan {
    /// Successful enqueues the producer performs.
    pub budget: usize,
    /// Producer/consumer delays.
    pub timing: QueueTiming,
    /// How long to let the consumer drain once the producer is done.
    pub drain_grace: Duration,
    /// Bounded wait for the consumer join; the producer join additionally
    /// gets one `timing.round_trip()` per budgeted message.
    pub timeout: Duration,
}

/// Run one producer and one always-on consumer, then cancel the consumer.
///
/// Sequence: start both, join the producer, wait up to `drain_grace` for the
/// queue to go idle, cancel, join the consumer.
///
/// # Errors
///
/// Returns `Error::HazardDetected` if either role misses its deadline, or a
/// harness error.
pub fn handoff_run(plan: HandoffPlan) -> Result<HandoffReport> {
    let queue = Arc::new(FlagGatedQueue::new(plan.timing));
    let cancel = CancelToken::new();

    let mut consumers = ThreadGroup::new();
    let consumer = Consumer::new(Arc::clone(&queue), cancel.clone());
    let consumer_slot = consumers.spawn("consumer", move || consumer.run())?;

    let mut producers = ThreadGroup::new();
    let producer = Producer::new(Arc::clone(&queue), plan.budget);
    let producer_slot = producers.spawn("producer", move || producer.run())?;

    let per_message = plan.timing.round_trip();
    let producer_deadline = plan
        .timeout
        .saturating_add(per_message.saturating_mul(u32::try_from(plan.budget).unwrap_or(u32::MAX)));
    if let Err(err) = producers
        .join_within(producer_deadline)?
        .into_result("handoff producer")
    {
        cancel.cancel();
        return Err(err);
    }
    info!("producer has finished");

    if !wait_until_idle(&queue, plan.drain_grace) {
        warn!(grace = ?plan.drain_grace, "queue still busy when draining ended");
    }

    cancel.cancel();
    consumers
        .join_within(plan.timeout)?
        .into_result("handoff consumer")?;
    info!("consumer has finished");

    let report = HandoffReport {
        producer: producer_slot.take().unwrap_or_default(),
        consumer: consumer_slot.take().unwrap_or_default(),
        residual: queue.snapshot(),
    };
    info!(final_queue_size = report.residual.pending, "handoff run finished");
    Ok(report)
}

/// Poll the queue until it is idle or `grace` elapsed. Returns whether it
/// went idle.
pub fn wait_until_idle(queue: &FlagGatedQueue, grace: Duration) -> bool {
    let started = Instant::now();
    let step = queue
        .timing()
        .consumer_poll
        .clamp(Duration::from_millis(1), Duration::from_millis(10));

    loop {
        if queue.snapshot().is_idle() {
            return true;
        }
        if started.elapsed() >= grace {
            return false;
        }
        thread::sleep(step);
    }
}
