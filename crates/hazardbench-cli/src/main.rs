#![allow(clippy::doc_markdown)]
//! `hazardbench` CLI - drives the lock-order and handoff scenarios
//!
//! Usage:
//!   `hazardbench lock-order --trials 10 --strict`
//!   `hazardbench disjoint --keys 5`
//!   `hazardbench handoff --budget 3 --json`
//!   `hazardbench config`

mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use hazardbench_core::harness::{self, HandoffPlan};
use hazardbench_core::{DualLockCache, HazardConfig, WriterOp};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hazardbench")]
#[command(
    author,
    version,
    about = "hazardbench CLI - Deliberately hazardous concurrency scenarios"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./hazardbench.toml when present)
    #[arg(short, long, global = true, env = "HAZARDBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print reports as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Write-side operation raced against `read`
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum WriterArg {
    #[default]
    Invalidate,
    Put,
}

impl From<WriterArg> for WriterOp {
    fn from(w: WriterArg) -> Self {
        match w {
            WriterArg::Invalidate => WriterOp::Invalidate,
            WriterArg::Put => WriterOp::Put,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Race `read` against a writer on one key, repeatedly
    LockOrder {
        /// Number of trials (defaults to `harness.trials`)
        #[arg(short, long)]
        trials: Option<u32>,

        /// Join deadline per trial in ms (defaults to `harness.join_timeout_ms`)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Writer operation
        #[arg(long, value_enum, default_value = "invalidate")]
        writer: WriterArg,

        /// Exit non-zero when any trial deadlocks
        #[arg(long)]
        strict: bool,
    },

    /// Put and invalidate on disjoint key ranges concurrently
    Disjoint {
        /// Keys per writer
        #[arg(short, long, default_value = "5")]
        keys: usize,

        /// Join deadline in ms (defaults to `harness.join_timeout_ms`)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Run the producer/consumer handoff
    Handoff {
        /// Messages to enqueue (defaults to `queue.budget`)
        #[arg(short, long)]
        budget: Option<usize>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn load_config(cli: &Cli) -> anyhow::Result<HazardConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            HazardConfig::load_from_path(path)?
        }
        None => HazardConfig::load()?,
    };
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &HazardConfig, explicit_level: bool) -> anyhow::Result<()> {
    let filter = if explicit_level {
        EnvFilter::new(&config.logging.level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config, cli.log_level.is_some())?;
    info!(
        level = %config.logging.level,
        format = %config.logging.format,
        "configuration loaded"
    );

    let join_timeout =
        |override_ms: Option<u64>| override_ms.map_or(config.harness.join_timeout(), Duration::from_millis);

    match cli.command {
        Commands::LockOrder {
            trials,
            timeout_ms,
            writer,
            strict,
        } => {
            let trials = trials.unwrap_or(config.harness.trials);
            if trials == 0 {
                anyhow::bail!("--trials must be at least 1");
            }
            info!(scenario = "lock-order", trials, ?writer, "scenario started");
            let report = harness::lock_order_campaign(
                trials,
                config.cache.timing(),
                writer.into(),
                join_timeout(timeout_ms),
            )?;

            info!(
                scenario = "lock-order",
                deadlocked = report.deadlocked,
                "scenario finished"
            );

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_campaign(&report);
            }

            if strict && report.hazard_observed() {
                anyhow::bail!(
                    "{} of {} trials deadlocked",
                    report.deadlocked,
                    report.trials
                );
            }
        }
        Commands::Disjoint { keys, timeout_ms } => {
            info!(scenario = "disjoint", keys, "scenario started");
            let cache = Arc::new(DualLockCache::with_timing(config.cache.timing()));
            let outcome = harness::disjoint_writers(&cache, keys, join_timeout(timeout_ms))?;
            if outcome.is_completed() {
                info!(scenario = "disjoint", "scenario finished");
            } else {
                warn!(scenario = "disjoint", stuck = ?outcome.stuck(), "scenario timed out");
            }

            if cli.json {
                let body = serde_json::json!({ "outcome": outcome, "stats": cache.stats() });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                output::print_outcome("disjoint", &outcome, &cache.stats());
            }
            outcome.into_result("disjoint")?;
        }
        Commands::Handoff { budget } => {
            let plan = HandoffPlan {
                budget: budget.unwrap_or(config.queue.budget),
                timing: config.queue.timing(),
                drain_grace: config.queue.drain_grace(),
                timeout: config.harness.join_timeout(),
            };
            info!(scenario = "handoff", budget = plan.budget, "scenario started");
            let report = harness::handoff_run(plan)?;
            info!(
                scenario = "handoff",
                processed = report.consumer.processed.len(),
                "scenario finished"
            );

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_handoff(&report);
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
