//! Bounded retry around a single flush.
//!
//! Only smooths faults inside one tick (a dropped connection, a locked
//! database). Backoff across ticks belongs to [`ConnectionHealth`](super::ConnectionHealth).

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

/// Runs an operation up to `1 + retry_count` times with a fixed delay between attempts.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    retry_count: usize,
    delay: Duration,
}

impl RetryExecutor {
    pub fn new(retry_count: usize, delay: Duration) -> Self {
        RetryExecutor { retry_count, delay }
    }

    /// Runs `operation`, retrying on any error until the attempts are spent.
    ///
    /// The error of the last attempt is returned unchanged.
    pub async fn execute<F, Fut, R, E>(&self, mut operation: F) -> Result<R, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        let strategy = FixedInterval::new(self.delay).take(self.retry_count);
        let attempts = AtomicUsize::new(0);
        let max_attempts = self.retry_count + 1;

        Retry::spawn(strategy, || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let fut = operation();
            async move {
                let result = fut.await;
                if let Err(e) = &result {
                    if attempt < max_attempts {
                        log::warn!(
                            "Attempt {}/{} failed, retrying: {}",
                            attempt,
                            max_attempts,
                            e
                        );
                    } else {
                        log::debug!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                    }
                }
                result
            }
        })
        .await
    }
}
