//! periodic_batching library: batched, timer-driven delivery of log records
//!
//! Producers hand records to a [`BatchScheduler`] without ever waiting on the
//! destination. A timer-driven tick drains the queue into capped batches and
//! writes them through a [`SinkWriter`], retrying transient failures and
//! backing off (eventually dropping data) while the sink stays down.
//!
//! # Example
//!
//! ```no_run
//! use periodic_batching::storage::{ensure_destination, init_db_pool_with_path};
//! use periodic_batching::{BatchScheduler, BatchingOptions, RequestLog, SqliteBulkWriter};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BatchingOptions::new(Duration::from_secs(5));
//! let pool = init_db_pool_with_path("logs.db".as_ref(), &options.destination_namespace).await?;
//! let sample = RequestLog {
//!     url: "https://example.com".to_string(),
//!     response: "Hello World".to_string(),
//!     time_taken: 5,
//! };
//! ensure_destination(&pool, &options.destination_namespace, &sample).await?;
//!
//! let writer = SqliteBulkWriter::new(pool, options.destination_namespace.clone());
//! let scheduler = BatchScheduler::new(options, writer)?;
//! scheduler.enqueue(sample)?;
//! scheduler.dispose_and_flush().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! Ticks run on a Tokio runtime. Construct the scheduler inside one (or pass
//! a handle to [`BatchScheduler::with_runtime`]); producers may enqueue from
//! any thread.

pub mod batching;
pub mod config;
mod error_handling;
pub mod initialization;
pub mod storage;

// Re-export public API
pub use batching::{BatchScheduler, HealthSnapshot, Lifecycle, Record, SinkWriter};
pub use config::{BatchingOptions, HealthPolicy, LogFormat, LogLevel};
pub use error_handling::{BatchingError, DatabaseError, InitializationError, SinkError};
pub use storage::{RequestLog, SqlRecord, SqlValue, SqliteBulkWriter};
