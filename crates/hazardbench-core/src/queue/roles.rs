//! Producer and consumer loops for the flag-gated queue.

use serde::Serialize;
use tracing::{debug, trace};

use super::flag_gated::{CancelToken, FlagGatedQueue};
use crate::sync::{self, Arc};

/// Outcome of a finished producer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProducerReport {
    /// Successful enqueues. Always equals the budget once `run` returns.
    pub enqueued: usize,
    /// Attempts rejected because the flag was still raised.
    pub retries: u64,
}

/// Outcome of a cancelled consumer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerReport {
    /// Messages fully processed, in the order they were claimed.
    pub processed: Vec<String>,
}

/// Bounded producer. Spins on the handoff flag; never blocks on it.
pub struct Producer {
    queue: Arc<FlagGatedQueue>,
    budget: usize,
}

impl Producer {
    /// A producer that will perform `budget` successful enqueues.
    #[must_use]
    pub fn new(queue: Arc<FlagGatedQueue>, budget: usize) -> Self {
        Self { queue, budget }
    }

    /// Number of successful enqueues this producer performs.
    #[must_use]
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Run until `budget` messages have been enqueued.
    ///
    /// A rejected attempt does not consume budget: the same message index is
    /// retried after the next delay.
    pub fn run(&self) -> ProducerReport {
        let timing = self.queue.timing();
        let mut report = ProducerReport::default();
        let mut next = 0;

        while next < self.budget {
            sync::pause(timing.producer_delay);

            let message = format!("New Message {next}");
            if self.queue.try_enqueue(&message) {
                next += 1;
                report.enqueued += 1;
            } else {
                trace!(attempt = next, "producer waiting for consumer to process previous message");
                report.retries += 1;
            }
        }

        debug!(enqueued = report.enqueued, retries = report.retries, "producer finished");
        report
    }
}

/// Consumer that polls until cancelled.
pub struct Consumer {
    queue: Arc<FlagGatedQueue>,
    cancel: CancelToken,
}

impl Consumer {
    /// A consumer that stops once `cancel` is triggered.
    #[must_use]
    pub fn new(queue: Arc<FlagGatedQueue>, cancel: CancelToken) -> Self {
        Self { queue, cancel }
    }

    /// Poll the queue until cancelled.
    ///
    /// Cancellation is checked before and after the poll delay, never while a
    /// message is being processed. A message left in `pending` at that point
    /// stays there.
    pub fn run(&self) -> ConsumerReport {
        let timing = self.queue.timing();
        let mut report = ConsumerReport::default();

        while !self.cancel.is_cancelled() {
            sync::pause(timing.consumer_poll);
            if self.cancel.is_cancelled() {
                break;
            }
            if let Some(message) = self.queue.try_consume() {
                report.processed.push(message);
            }
        }

        debug!(processed = report.processed.len(), "consumer cancelled");
        report
    }
}
