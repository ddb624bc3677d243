//! Periodic batching core.
//!
//! Leaf-first:
//! - `retry`: bounded retry with a fixed delay around one flush
//! - `timer`: restartable single-shot timer driving ticks
//! - `health`: consecutive-failure backoff and drop policy
//! - `queue`: non-blocking multi-producer ingestion queue
//! - `scheduler`: the tick loop tying them together

mod health;
mod queue;
mod retry;
mod scheduler;
mod sink;
mod timer;

pub use health::ConnectionHealth;
pub use queue::{ingestion_queue, IngestionQueue, QueueDrain};
pub use retry::RetryExecutor;
pub use scheduler::{BatchScheduler, HealthSnapshot, Lifecycle};
pub use sink::{Record, SinkWriter};
pub use timer::{SuspendableTimer, TickCallback, TickFuture};
