// Shared test helpers: a scripted sink writer, a simple record type and polling utilities.

#![allow(dead_code)] // Each test file uses a different subset

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use periodic_batching::{BatchingOptions, HealthPolicy, Record, SinkError, SinkWriter};

/// Record tagged with its producer and per-producer sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub producer: usize,
    pub seq: usize,
}

impl Event {
    pub fn new(seq: usize) -> Self {
        Event { producer: 0, seq }
    }
}

impl Record for Event {
    fn column_names(&self) -> Vec<String> {
        vec!["producer".to_string(), "seq".to_string()]
    }

    fn destination_name(&self) -> String {
        "events".to_string()
    }
}

/// How a [`ScriptedSink`] answers write attempts.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Every attempt succeeds
    Healthy,
    /// The first `n` attempts fail, every later one succeeds
    FailFirst(usize),
    /// Every attempt fails, empty batches included
    AlwaysFail,
}

/// Sink writer that records every attempt and fails according to a [`Script`].
pub struct ScriptedSink {
    script: Script,
    write_delay: Duration,
    attempts: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    /// Every non-empty batch presented, successful or not
    presented: Mutex<Vec<Vec<Event>>>,
    /// Non-empty batches that were written successfully
    delivered: Mutex<Vec<Vec<Event>>>,
}

impl ScriptedSink {
    pub fn new(script: Script) -> Self {
        Self::with_delay(script, Duration::ZERO)
    }

    pub fn with_delay(script: Script, write_delay: Duration) -> Self {
        ScriptedSink {
            script,
            write_delay,
            attempts: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            presented: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_writes(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn presented(&self) -> Vec<Vec<Event>> {
        self.presented.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> Vec<Vec<Event>> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_events(&self) -> Vec<Event> {
        self.delivered().into_iter().flatten().collect()
    }

    pub fn delivered_seqs(&self) -> Vec<usize> {
        self.delivered_events().iter().map(|e| e.seq).collect()
    }
}

#[async_trait]
impl SinkWriter<Event> for ScriptedSink {
    async fn write(&self, batch: &[Event]) -> Result<(), SinkError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        if !batch.is_empty() {
            self.presented.lock().unwrap().push(batch.to_vec());
        }

        let fail = match self.script {
            Script::Healthy => false,
            Script::FailFirst(n) => attempt < n,
            Script::AlwaysFail => true,
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        if fail {
            return Err(SinkError::Transient(format!("attempt {attempt} refused")));
        }
        if !batch.is_empty() {
            self.delivered.lock().unwrap().push(batch.to_vec());
        }
        Ok(())
    }
}

/// Options with short timings: `period_ms` between ticks, 1ms retry delay,
/// and a backoff policy measured in milliseconds.
pub fn fast_options(period_ms: u64, batch_size_limit: usize) -> BatchingOptions {
    BatchingOptions {
        batch_size_limit,
        retry_delay: Duration::from_millis(1),
        health: HealthPolicy {
            minimum_backoff: Duration::from_millis(2),
            maximum_backoff: Duration::from_millis(10),
            ..Default::default()
        },
        ..BatchingOptions::new(Duration::from_millis(period_ms))
    }
}

/// Polls `condition` every few milliseconds until it holds or `timeout` elapses.
pub async fn wait_until<F: FnMut() -> bool>(timeout: Duration, mut condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
