//! Flag-gated single-slot queue hazard scenario.
//!
//! One producer and one consumer share a FIFO and an `in_flight` flag behind a
//! single mutex:
//!
//! - the producer may only enqueue while the flag is clear, and raises it;
//! - the consumer pops, processes **while still holding the mutex**, then
//!   clears the flag;
//! - a producer that finds the flag raised spins (delay, retry the same
//!   message) instead of waiting on a signal.
//!
//! There is no raw data race here. What the scenario exposes is protocol
//! fragility: producer progress is serialized behind consumer latency, and
//! the spin can starve depending on scheduling granularity.

mod flag_gated;
mod roles;

pub use flag_gated::{CancelToken, FlagGatedQueue, QueueSnapshot, QueueTiming};
pub use roles::{Consumer, ConsumerReport, Producer, ProducerReport};
