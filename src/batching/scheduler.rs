//! Tick-driven batch scheduler.
//!
//! Producers call [`BatchScheduler::enqueue`]; a timer-driven tick drains the
//! queue into capped batches, writes them through the retry wrapper, feeds the
//! outcome to [`ConnectionHealth`] and re-arms the timer with the interval it
//! picks. Shutdown runs one last tick so whatever is still queued gets a chance
//! to reach the sink.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::config::BatchingOptions;
use crate::error_handling::{BatchingError, SinkError};

use super::health::ConnectionHealth;
use super::queue::{ingestion_queue, IngestionQueue, QueueDrain};
use super::retry::RetryExecutor;
use super::sink::{validate_record, Record, SinkWriter};
use super::timer::{SuspendableTimer, TickCallback, TickFuture};

/// Scheduler lifecycle. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, nothing enqueued yet
    NotStarted,
    /// First record seen, ticks are scheduled
    Running,
    /// Shutdown requested; new records are discarded
    Unloading,
}

impl Lifecycle {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Lifecycle::NotStarted,
            1 => Lifecycle::Running,
            _ => Lifecycle::Unloading,
        }
    }
}

/// Point-in-time view of the scheduler's health, for monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub consecutive_failures: u32,
    pub next_interval: Duration,
    /// Records held back from a failed write, retried on the next tick
    pub pending_batch: usize,
    /// Records waiting in the queue
    pub backlog: usize,
}

/// Batches records and flushes them to a [`SinkWriter`] on a timer.
///
/// Dropping a running scheduler runs the final flush and waits for it, the
/// same way [`dispose_and_flush_blocking`](Self::dispose_and_flush_blocking)
/// does. The one exception is a drop on a current-thread runtime while a tick
/// is suspended mid-write: the flush is then spawned on the runtime and only
/// completes if the runtime keeps running. Prefer
/// [`dispose_and_flush`](Self::dispose_and_flush) in async code.
pub struct BatchScheduler<T: Record, W: SinkWriter<T>> {
    inner: Arc<SchedulerInner<T, W>>,
}

struct SchedulerInner<T: Record, W: SinkWriter<T>> {
    batch_size_limit: usize,
    writer: W,
    retry: RetryExecutor,
    queue: IngestionQueue<T>,
    lifecycle: AtomicU8,
    /// Serializes the `NotStarted` to `Running` transition
    start_lock: Mutex<()>,
    tick_state: tokio::sync::Mutex<TickState<T>>,
    timer: SuspendableTimer,
    runtime: Handle,
}

/// Owned by whichever tick is running.
struct TickState<T> {
    drain: QueueDrain<T>,
    pending: Vec<T>,
    health: ConnectionHealth,
}

impl<T: Record, W: SinkWriter<T>> BatchScheduler<T, W> {
    /// Creates a scheduler on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for invalid options, `RuntimeUnavailable` when called
    /// outside a runtime.
    pub fn new(options: BatchingOptions, writer: W) -> Result<Self, BatchingError> {
        let runtime = Handle::try_current().map_err(|_| BatchingError::RuntimeUnavailable)?;
        Self::with_runtime(options, writer, runtime)
    }

    /// Creates a scheduler whose ticks run on `runtime`.
    ///
    /// Producers may then enqueue from any thread, inside a runtime or not.
    pub fn with_runtime(
        options: BatchingOptions,
        writer: W,
        runtime: Handle,
    ) -> Result<Self, BatchingError> {
        options.validate()?;

        let (queue, drain) = ingestion_queue();
        let inner = Arc::new_cyclic(|weak: &Weak<SchedulerInner<T, W>>| {
            let weak = weak.clone();
            let callback: TickCallback = Arc::new(move || -> TickFuture {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_tick().await;
                    }
                })
            });

            SchedulerInner {
                batch_size_limit: options.batch_size_limit,
                writer,
                retry: RetryExecutor::new(options.retry_count, options.retry_delay),
                queue,
                lifecycle: AtomicU8::new(Lifecycle::NotStarted as u8),
                start_lock: Mutex::new(()),
                tick_state: tokio::sync::Mutex::new(TickState {
                    drain,
                    pending: Vec::with_capacity(options.batch_size_limit),
                    health: ConnectionHealth::new(options.period, options.health.clone()),
                }),
                timer: SuspendableTimer::new(runtime.clone(), callback),
                runtime,
            }
        });

        Ok(BatchScheduler { inner })
    }

    /// Queues a record for the next flush. Never blocks on the sink.
    ///
    /// The first record starts the scheduler and is flushed right away.
    /// Records arriving after shutdown started are discarded.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the record has no destination name or no columns.
    pub fn enqueue(&self, record: T) -> Result<(), BatchingError> {
        validate_record(&record)?;

        match self.inner.lifecycle() {
            Lifecycle::Running => {}
            Lifecycle::Unloading => {
                log::trace!("Scheduler unloading, discarding record");
                return Ok(());
            }
            Lifecycle::NotStarted => {
                let _start = self
                    .inner
                    .start_lock
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                match self.inner.lifecycle() {
                    Lifecycle::NotStarted => {
                        // Queued before the flip so a racing dispose flushes it
                        self.inner.queue.enqueue(record);
                        self.inner.set_lifecycle(Lifecycle::Running);
                        // Get the first record across as quickly as possible
                        self.inner.timer.start(Duration::ZERO);
                        log::debug!("Batch scheduler started");
                        return Ok(());
                    }
                    Lifecycle::Unloading => {
                        log::trace!("Scheduler unloading, discarding record");
                        return Ok(());
                    }
                    Lifecycle::Running => {}
                }
            }
        }

        if !self.inner.queue.enqueue(record) {
            log::debug!("Queue consumer gone, discarding record");
        }
        Ok(())
    }

    /// Stops the timer and flushes what is left, waiting for the final tick.
    ///
    /// The final tick runs as its own task on the scheduler's runtime. Only the
    /// first call has an effect; a scheduler that never received a record has
    /// nothing to flush.
    pub async fn dispose_and_flush(&self) {
        if !self.inner.begin_unloading() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        if let Err(e) = self
            .inner
            .runtime
            .spawn(async move { inner.final_flush().await })
            .await
        {
            log::error!("Final flush task failed: {}", e);
        }
    }

    /// Blocking variant of [`dispose_and_flush`](Self::dispose_and_flush).
    ///
    /// The final tick runs on a dedicated thread with its own runtime, so the
    /// caller's executor does not need to make progress for it to finish. Do
    /// not call from a current-thread runtime that may be mid-tick; use the
    /// async variant there.
    pub fn dispose_and_flush_blocking(&self) {
        if !self.inner.begin_unloading() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let worker = std::thread::Builder::new()
            .name("periodic-batching-flush".to_string())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(inner.final_flush()),
                    Err(e) => log::error!("Failed to build runtime for final flush: {}", e),
                }
            });

        match worker {
            Ok(handle) => {
                if handle.join().is_err() {
                    log::error!("Final flush thread panicked");
                }
            }
            Err(e) => log::error!("Failed to spawn final flush thread: {}", e),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle()
    }

    /// Current health, taken between ticks.
    pub async fn health(&self) -> HealthSnapshot {
        let state = self.inner.tick_state.lock().await;
        HealthSnapshot {
            consecutive_failures: state.health.consecutive_failures(),
            next_interval: state.health.next_interval(),
            pending_batch: state.pending.len(),
            backlog: state.drain.len(),
        }
    }

    pub fn writer(&self) -> &W {
        &self.inner.writer
    }
}

impl<T: Record, W: SinkWriter<T>> Drop for BatchScheduler<T, W> {
    fn drop(&mut self) {
        if self.lifecycle() != Lifecycle::Running {
            return;
        }

        let Ok(current) = Handle::try_current() else {
            self.dispose_and_flush_blocking();
            return;
        };

        match current.runtime_flavor() {
            RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.dispose_and_flush_blocking());
            }
            // Nothing on this runtime can make progress while we block, so
            // blocking is only safe when no tick is parked holding the state
            _ if self.inner.tick_idle() => self.dispose_and_flush_blocking(),
            _ => {
                if !self.inner.begin_unloading() {
                    return;
                }
                log::warn!(
                    "Scheduler dropped mid-tick on a current-thread runtime; flushing {} queued records in the background, they are lost if the runtime stops first",
                    self.inner.queue.len()
                );
                let inner = Arc::clone(&self.inner);
                self.inner
                    .runtime
                    .spawn(async move { inner.final_flush().await });
            }
        }
    }
}

impl<T: Record, W: SinkWriter<T>> SchedulerInner<T, W> {
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::SeqCst))
    }

    fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.lifecycle.store(lifecycle as u8, Ordering::SeqCst);
    }

    /// Moves `Running` to `Unloading`. Returns `false` if there is nothing to do.
    fn begin_unloading(&self) -> bool {
        self.lifecycle
            .compare_exchange(
                Lifecycle::Running as u8,
                Lifecycle::Unloading as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// No tick is executing or holding the tick state.
    fn tick_idle(&self) -> bool {
        !self.timer.is_running() && self.tick_state.try_lock().is_ok()
    }

    async fn final_flush(&self) {
        self.timer.dispose().await;
        log::debug!("Running final flush");
        self.on_tick().await;
        log::debug!("Batch scheduler shut down");
    }

    async fn on_tick(&self) {
        let mut state = self.tick_state.lock().await;
        let TickState {
            drain,
            pending,
            health,
        } = &mut *state;

        if let Err(e) = self.flush_backlog(drain, pending, health).await {
            log::error!(
                "Failed to emit periodic batch of {} records: {}",
                pending.len(),
                e
            );
            health.on_failure();
        }

        if health.should_drop_batch() && !pending.is_empty() {
            log::warn!(
                "Dropping batch of {} records after {} consecutive failed ticks",
                pending.len(),
                health.consecutive_failures()
            );
            pending.clear();
        }

        if health.should_drop_queue() {
            let dropped = drain.drain_discard();
            if dropped > 0 {
                log::warn!(
                    "Dropping {} queued records after {} consecutive failed ticks",
                    dropped,
                    health.consecutive_failures()
                );
            }
        }

        // A dispose racing this check leaves the timer disposed, and start is a no-op then
        let next = health.next_interval();
        if self.lifecycle() != Lifecycle::Unloading {
            log::trace!("Next tick in {:?}", next);
            self.timer.start(next);
        }
    }

    /// Drains and writes capped batches until one comes out short.
    async fn flush_backlog(
        &self,
        drain: &mut QueueDrain<T>,
        pending: &mut Vec<T>,
        health: &mut ConnectionHealth,
    ) -> Result<(), SinkError> {
        loop {
            drain.fill(pending, self.batch_size_limit);

            let batch = pending.as_slice();
            self.retry.execute(|| self.writer.write(batch)).await?;

            let count = pending.len();
            let was_full = count >= self.batch_size_limit;
            pending.clear();
            health.on_success();

            if count > 0 {
                log::debug!("Flushed batch of {} records", count);
            }
            if !was_full {
                return Ok(());
            }
        }
    }
}
