//! Error types for `hazardbench`.
//!
//! The scenario operations themselves never fail: they either complete or
//! block. Errors only come from the harness that drives them, and the most
//! interesting one, [`Error::HazardDetected`], means a scenario did not finish
//! within its deadline.

use thiserror::Error;

/// Result type alias for `hazardbench` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a hazard scenario.
///
/// Error codes follow the pattern `HAZ-XXX` for easy grepping in CI logs.
#[derive(Error, Debug)]
pub enum Error {
    /// Scenario threads did not complete within the deadline (HAZ-001).
    ///
    /// For the lock-order scenario this is the expected evidence of a
    /// circular wait. The stuck threads stay blocked; they cannot be
    /// cancelled.
    #[error("[HAZ-001] Hazard detected in '{scenario}': {} thread(s) still blocked ({})", .stuck.len(), .stuck.join(", "))]
    HazardDetected {
        /// Scenario label.
        scenario: String,
        /// Names of the threads that never reported completion.
        stuck: Vec<String>,
    },

    /// A scenario thread panicked (HAZ-002).
    #[error("[HAZ-002] Scenario thread panicked: {0}")]
    ThreadPanicked(String),

    /// The OS refused to spawn a scenario thread (HAZ-003).
    #[error("[HAZ-003] Failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Configuration error (HAZ-004).
    #[error("[HAZ-004] Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the error code (e.g., "HAZ-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::HazardDetected { .. } => "HAZ-001",
            Self::ThreadPanicked(_) => "HAZ-002",
            Self::Spawn(_) => "HAZ-003",
            Self::Config(_) => "HAZ-004",
        }
    }

    /// Returns true if this error reports an observed concurrency hazard
    /// rather than a harness malfunction.
    #[must_use]
    pub const fn is_hazard(&self) -> bool {
        matches!(self, Self::HazardDetected { .. })
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
