//! Connection health across ticks.
//!
//! Tracks consecutive failed ticks, stretches the tick interval while the sink
//! is down, and decides when queued data is abandoned to bound memory.

use std::time::Duration;

use crate::config::HealthPolicy;

/// Consecutive-failure state machine driving tick cadence and drop policy.
///
/// Interval growth: the base period up to the first failure, then
/// `max(period, minimum_backoff) * 2^(failures - 1)` capped at
/// `maximum_backoff`, never below the base period.
#[derive(Debug, Clone)]
pub struct ConnectionHealth {
    period: Duration,
    policy: HealthPolicy,
    consecutive_failures: u32,
    current_interval: Duration,
}

impl ConnectionHealth {
    pub fn new(period: Duration, policy: HealthPolicy) -> Self {
        ConnectionHealth {
            period,
            policy,
            consecutive_failures: 0,
            current_interval: period,
        }
    }

    /// Records a successful flush.
    pub fn on_success(&mut self) {
        if self.consecutive_failures > 0 {
            log::info!(
                "Sink recovered after {} consecutive failed ticks",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
        self.current_interval = self.period;
    }

    /// Records a flush that failed after all retries.
    pub fn on_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.current_interval = self.backoff_for(self.consecutive_failures);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Delay before the next tick.
    pub fn next_interval(&self) -> Duration {
        self.current_interval
    }

    /// The in-flight batch should be abandoned rather than retried again.
    pub fn should_drop_batch(&self) -> bool {
        self.consecutive_failures >= self.policy.batch_drop_threshold
    }

    /// The whole backlog should be discarded.
    pub fn should_drop_queue(&self) -> bool {
        self.consecutive_failures >= self.policy.queue_drop_threshold
    }

    fn backoff_for(&self, failures: u32) -> Duration {
        if failures <= 1 {
            return self.period;
        }

        let base = self.period.max(self.policy.minimum_backoff);
        let factor = 2u32.checked_pow(failures - 1).unwrap_or(u32::MAX);
        let backed_off = base
            .saturating_mul(factor)
            .min(self.policy.maximum_backoff);

        backed_off.max(self.period)
    }
}
