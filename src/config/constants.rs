//! Configuration constants.
//!
//! Defaults for the batching scheduler, the retry wrapper around each flush,
//! and the connection-health backoff policy.

use std::time::Duration;

/// Default time between ticks while the sink is healthy.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

/// Default schema the sink writes into.
pub const DEFAULT_DESTINATION_NAMESPACE: &str = "dbo";

/// Maximum number of records handed to the sink in one write.
pub const DEFAULT_BATCH_SIZE_LIMIT: usize = 50;

/// Retries after the first failed write within a single tick.
pub const DEFAULT_RETRY_COUNT: usize = 3;

/// Fixed delay between write attempts within a single tick.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

// Connection health (backoff across ticks)
/// Floor for the backed-off interval once failures start accumulating.
pub const MINIMUM_BACKOFF_PERIOD: Duration = Duration::from_secs(5);
/// Ceiling for the backed-off interval (10 minutes).
pub const MAXIMUM_BACKOFF_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// Consecutive failed ticks after which the in-flight batch is abandoned.
pub const FAILURES_BEFORE_DROPPING_BATCH: u32 = 8;
/// Consecutive failed ticks after which the whole backlog is discarded.
pub const FAILURES_BEFORE_DROPPING_QUEUE: u32 = 10;

/// SQLite schema names that exist on every connection without an ATTACH.
pub const BUILTIN_SCHEMAS: &[&str] = &["main", "temp"];

pub const DB_PATH: &str = "./periodic_batching.db";
