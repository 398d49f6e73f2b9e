//! # `hazardbench` Core
//!
//! Two deliberately broken concurrency scenarios, kept small so that a model
//! checker (or a careful reader) can find the flaw:
//!
//! - **[`DualLockCache`]**: two `RwLock`s taken in opposite orders by `read`
//!   and by `put` / `invalidate`. A reader racing a writer can deadlock.
//! - **[`FlagGatedQueue`]**: a producer and a consumer coordinating through a
//!   plain `in_flight` boolean behind one mutex, with the consumer holding
//!   that mutex across its simulated processing.
//!
//! The flaws are the product. Do not fix them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hazardbench_core::{harness, CacheTiming, DualLockCache, WriterOp};
//!
//! let cache = Arc::new(DualLockCache::with_timing(CacheTiming::default()));
//! let outcome = harness::lock_order_trial(&cache, "k", WriterOp::Invalidate, Duration::from_secs(2))?;
//! if !outcome.is_completed() {
//!     println!("circular wait: {:?}", outcome.stuck());
//! }
//! ```
//!
//! ## Model checking
//!
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test -p hazardbench-core --features loom --test loom_tests
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod cache;
pub mod config;
pub mod error;
#[cfg(test)]
mod error_tests;
#[cfg(not(loom))]
pub mod harness;
pub mod queue;
pub mod sync;

pub use cache::{CacheStats, CacheTiming, DualLockCache};
pub use config::{
    CacheConfig, ConfigError, HarnessConfig, HazardConfig, LoggingConfig, QueueConfig,
};
pub use error::{Error, Result};
#[cfg(not(loom))]
pub use harness::{
    CampaignReport, HandoffPlan, HandoffReport, JoinOutcome, ThreadGroup, WriterOp,
};
pub use queue::{
    CancelToken, Consumer, ConsumerReport, FlagGatedQueue, Producer, ProducerReport,
    QueueSnapshot, QueueTiming,
};
