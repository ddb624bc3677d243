//! Configuration types and CLI options.
//!
//! This module defines the library configuration (`BatchingOptions`,
//! `HealthPolicy`) and the command-line options of the demo driver.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DB_PATH, DEFAULT_BATCH_SIZE_LIMIT, DEFAULT_DESTINATION_NAMESPACE, DEFAULT_PERIOD,
    DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY, FAILURES_BEFORE_DROPPING_BATCH,
    FAILURES_BEFORE_DROPPING_QUEUE, MAXIMUM_BACKOFF_INTERVAL, MINIMUM_BACKOFF_PERIOD,
};
use crate::error_handling::BatchingError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Backoff and drop policy applied across ticks when the sink keeps failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthPolicy {
    /// Floor for the interval once the second consecutive failure is recorded
    pub minimum_backoff: Duration,
    /// Ceiling for the backed-off interval
    pub maximum_backoff: Duration,
    /// Consecutive failures at which the in-flight batch is abandoned
    pub batch_drop_threshold: u32,
    /// Consecutive failures at which the whole backlog is discarded
    pub queue_drop_threshold: u32,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            minimum_backoff: MINIMUM_BACKOFF_PERIOD,
            maximum_backoff: MAXIMUM_BACKOFF_INTERVAL,
            batch_drop_threshold: FAILURES_BEFORE_DROPPING_BATCH,
            queue_drop_threshold: FAILURES_BEFORE_DROPPING_QUEUE,
        }
    }
}

impl HealthPolicy {
    /// Checks the thresholds and the backoff bounds.
    pub fn validate(&self) -> Result<(), BatchingError> {
        if self.batch_drop_threshold == 0 {
            return Err(BatchingError::invalid(
                "batch_drop_threshold",
                "must be greater than zero",
            ));
        }
        if self.queue_drop_threshold <= self.batch_drop_threshold {
            return Err(BatchingError::invalid(
                "queue_drop_threshold",
                format!(
                    "must be greater than batch_drop_threshold ({})",
                    self.batch_drop_threshold
                ),
            ));
        }
        if self.maximum_backoff < self.minimum_backoff {
            return Err(BatchingError::invalid(
                "maximum_backoff",
                "must not be shorter than minimum_backoff",
            ));
        }
        Ok(())
    }
}

/// Library configuration for a [`BatchScheduler`](crate::BatchScheduler).
///
/// # Examples
///
/// ```no_run
/// use periodic_batching::BatchingOptions;
/// use std::time::Duration;
///
/// let options = BatchingOptions {
///     batch_size_limit: 100,
///     ..BatchingOptions::new(Duration::from_secs(2))
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct BatchingOptions {
    /// Time between ticks while the sink is healthy
    pub period: Duration,

    /// Schema the sink writes into
    pub destination_namespace: String,

    /// Maximum number of records per sink write
    pub batch_size_limit: usize,

    /// Retries after the first failed write within one tick
    pub retry_count: usize,

    /// Fixed delay between write attempts within one tick
    pub retry_delay: Duration,

    /// Backoff and drop policy across ticks
    pub health: HealthPolicy,
}

impl BatchingOptions {
    /// Options with the given period and every other field at its default.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Rejects non-positive periods and batch sizes and inconsistent health thresholds.
    pub fn validate(&self) -> Result<(), BatchingError> {
        if self.period.is_zero() {
            return Err(BatchingError::invalid(
                "period",
                "the period must be greater than zero",
            ));
        }
        if self.batch_size_limit == 0 {
            return Err(BatchingError::invalid(
                "batch_size_limit",
                "the batch size limit must be greater than zero",
            ));
        }
        if self.destination_namespace.trim().is_empty() {
            return Err(BatchingError::invalid(
                "destination_namespace",
                "the destination namespace must not be empty",
            ));
        }
        self.health.validate()
    }
}

impl Default for BatchingOptions {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            destination_namespace: DEFAULT_DESTINATION_NAMESPACE.to_string(),
            batch_size_limit: DEFAULT_BATCH_SIZE_LIMIT,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            health: HealthPolicy::default(),
        }
    }
}

/// Command-line options of the demo driver.
///
/// # Examples
///
/// ```bash
/// # Write 6 demo records every 5 seconds into ./periodic_batching.db
/// periodic_batching
///
/// # Larger run with smaller batches
/// periodic_batching --records 500 --batch-size-limit 20 --period-ms 250
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "periodic_batching",
    about = "Batches demo request logs into a SQLite table on a timer."
)]
pub struct Opt {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    #[arg(long, value_parser, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Milliseconds between ticks while the database is healthy
    #[arg(long, default_value_t = 5000)]
    pub period_ms: u64,

    /// Schema the records are written into (attached next to the database file)
    #[arg(long, default_value = DEFAULT_DESTINATION_NAMESPACE)]
    pub namespace: String,

    /// Maximum number of records per insert
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE_LIMIT)]
    pub batch_size_limit: usize,

    /// Retries after a failed insert within one tick
    #[arg(long, default_value_t = DEFAULT_RETRY_COUNT)]
    pub retry_count: usize,

    /// Number of demo records to enqueue
    #[arg(long, default_value_t = 6)]
    pub records: usize,
}

impl From<&Opt> for BatchingOptions {
    fn from(opt: &Opt) -> Self {
        BatchingOptions {
            period: Duration::from_millis(opt.period_ms),
            destination_namespace: opt.namespace.clone(),
            batch_size_limit: opt.batch_size_limit,
            retry_count: opt.retry_count,
            ..Default::default()
        }
    }
}
