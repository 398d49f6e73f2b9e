//! `hazardbench` Configuration Module
//!
//! Timings and budgets for the scenario drivers, loaded from
//! `hazardbench.toml`, environment variables and runtime overrides. The core
//! operations themselves take plain [`CacheTiming`] / [`QueueTiming`] values;
//! nothing here changes how the hazards behave, only how hard they are pushed.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (CLI flags)
//! 2. Environment variables (`HAZARDBENCH_*`)
//! 3. Configuration file (`hazardbench.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::cache::CacheTiming;
use crate::queue::QueueTiming;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Dual-lock cache section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Gap between the two acquisitions of `read` and `invalidate`.
    pub acquire_delay_ms: u64,
    /// Gap between the two acquisitions of `put`.
    pub put_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            acquire_delay_ms: 100,
            put_delay_ms: 0,
        }
    }
}

impl CacheConfig {
    /// Timing to hand to [`crate::DualLockCache::with_timing`].
    #[must_use]
    pub fn timing(&self) -> CacheTiming {
        CacheTiming {
            acquire_delay: Duration::from_millis(self.acquire_delay_ms),
            put_delay: Duration::from_millis(self.put_delay_ms),
        }
    }
}

/// Flag-gated queue section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Number of successful enqueues the producer performs.
    pub budget: usize,
    /// Delay before each producer attempt.
    pub producer_delay_ms: u64,
    /// Delay before each consumer check.
    pub consumer_poll_ms: u64,
    /// Simulated processing time, spent inside the critical section.
    pub processing_ms: u64,
    /// How long the driver lets the consumer drain after the producer finished.
    pub drain_grace_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            budget: 10,
            producer_delay_ms: 100,
            consumer_poll_ms: 200,
            processing_ms: 100,
            drain_grace_ms: 1000,
        }
    }
}

impl QueueConfig {
    /// Timing to hand to [`crate::FlagGatedQueue::new`].
    #[must_use]
    pub fn timing(&self) -> QueueTiming {
        QueueTiming {
            producer_delay: Duration::from_millis(self.producer_delay_ms),
            consumer_poll: Duration::from_millis(self.consumer_poll_ms),
            processing: Duration::from_millis(self.processing_ms),
        }
    }

    /// Drain grace period as a `Duration`.
    #[must_use]
    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }
}

/// Harness section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Bounded wait before a scenario is declared stuck.
    pub join_timeout_ms: u64,
    /// Number of lock-order trials per campaign.
    pub trials: u32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            join_timeout_ms: 2000,
            trials: 5,
        }
    }
}

impl HarnessConfig {
    /// Join timeout as a `Duration`.
    #[must_use]
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `hazardbench` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HazardConfig {
    /// Dual-lock cache configuration.
    pub cache: CacheConfig,
    /// Flag-gated queue configuration.
    pub queue: QueueConfig,
    /// Harness configuration.
    pub harness: HarnessConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl HazardConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("hazardbench.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("HAZARDBENCH_").split("__").lowercase(true));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.budget == 0 {
            return Err(ConfigError::InvalidValue {
                key: "queue.budget".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if self.harness.join_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "harness.join_timeout_ms".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        if self.harness.trials == 0 {
            return Err(ConfigError::InvalidValue {
                key: "harness.trials".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        // A consumer that never waits turns the poll loop into a hot spin.
        if self.queue.consumer_poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "queue.consumer_poll_ms".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
