//! Single-slot handoff queue gated by a shared boolean.
//!
//! `pending` and `in_flight` live behind one mutex and are only ever touched
//! together. The flag is a plain `bool`, not a semaphore or condvar: the
//! producer polls it and the consumer clears it, and that is the whole
//! protocol.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::sync::{self, Arc, AtomicBool, Mutex, Ordering};

/// Delays that shape the producer/consumer interleaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueTiming {
    /// Sleep before every producer attempt, successful or not.
    pub producer_delay: Duration,
    /// Sleep before every consumer check.
    pub consumer_poll: Duration,
    /// Simulated processing, spent while holding the critical section.
    pub processing: Duration,
}

impl QueueTiming {
    /// Upper bound on one produce / poll / process cycle.
    #[must_use]
    pub fn round_trip(&self) -> Duration {
        self.producer_delay + self.consumer_poll + self.processing
    }
}

impl Default for QueueTiming {
    fn default() -> Self {
        Self {
            producer_delay: Duration::from_millis(100),
            consumer_poll: Duration::from_millis(200),
            processing: Duration::from_millis(100),
        }
    }
}

/// State guarded by the single critical section.
#[derive(Debug, Default)]
struct HandoffState {
    pending: VecDeque<String>,
    in_flight: bool,
}

/// What an outside observer sees after entering the critical section once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QueueSnapshot {
    /// Messages enqueued and not yet claimed by the consumer.
    pub pending: usize,
    /// Handoff flag.
    pub in_flight: bool,
}

impl QueueSnapshot {
    /// Nothing pending and nothing being processed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && !self.in_flight
    }
}

/// Queue shared by one producer role and one consumer role.
pub struct FlagGatedQueue {
    state: Mutex<HandoffState>,
    timing: QueueTiming,
}

impl FlagGatedQueue {
    /// Create an empty queue with the flag cleared.
    #[must_use]
    pub fn new(timing: QueueTiming) -> Self {
        Self {
            state: Mutex::new(HandoffState::default()),
            timing,
        }
    }

    /// Delays used by the producer and consumer roles.
    #[must_use]
    pub fn timing(&self) -> QueueTiming {
        self.timing
    }

    /// One producer attempt.
    ///
    /// Inside the critical section: if the flag is clear, append `message`,
    /// raise the flag and return `true`. Otherwise leave everything untouched
    /// and return `false`; the caller is expected to retry.
    pub fn try_enqueue(&self, message: &str) -> bool {
        let mut state = sync::lock(&self.state);
        if state.in_flight {
            return false;
        }
        state.pending.push_back(message.to_string());
        state.in_flight = true;
        info!(msg = message, "producer added message");
        true
    }

    /// One consumer check.
    ///
    /// Inside the critical section: pop the front message, spend
    /// `timing.processing` without releasing the section, then clear the flag.
    /// Returns `None` without touching the flag when nothing is pending.
    pub fn try_consume(&self) -> Option<String> {
        let mut state = sync::lock(&self.state);
        let message = state.pending.pop_front()?;
        debug!(msg = %message, "consumer processing message");

        sync::pause(self.timing.processing);

        state.in_flight = false;
        info!(msg = %message, "consumer finished message");
        Some(message)
    }

    /// Enter the critical section once and report what is there.
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = sync::lock(&self.state);
        QueueSnapshot {
            pending: state.pending.len(),
            in_flight: state.in_flight,
        }
    }
}

impl Default for FlagGatedQueue {
    fn default() -> Self {
        Self::new(QueueTiming::default())
    }
}

/// Cooperative stop signal for the consumer.
///
/// Independent of the queue's critical section: it never guards queue state.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that has not been triggered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask every holder of this token to stop at its next iteration boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
