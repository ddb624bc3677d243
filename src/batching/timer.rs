//! Restartable single-shot timer driving the tick loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Future produced by the timer callback on each fire.
pub type TickFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked when the timer fires.
pub type TickCallback = Arc<dyn Fn() -> TickFuture + Send + Sync + 'static>;

/// Single-shot delay that can be re-armed and disposed.
///
/// At most one fire is pending: [`start`](Self::start) cancels whatever was
/// armed before. Callbacks never overlap; a fire that becomes due while a
/// callback is still running waits for it. The callback always runs on the
/// runtime captured at construction, never inside `start`.
///
/// The callback must not call [`dispose`](Self::dispose) on its own timer.
pub struct SuspendableTimer {
    runtime: Handle,
    callback: TickCallback,
    pending: Mutex<Option<CancellationToken>>,
    running: Arc<tokio::sync::Mutex<()>>,
    disposed: Arc<AtomicBool>,
}

impl SuspendableTimer {
    pub fn new(runtime: Handle, callback: TickCallback) -> Self {
        SuspendableTimer {
            runtime,
            callback,
            pending: Mutex::new(None),
            running: Arc::new(tokio::sync::Mutex::new(())),
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Arms the timer to fire once after `interval`, cancelling any pending arm.
    ///
    /// Returns `false` once the timer has been disposed.
    pub fn start(&self, interval: Duration) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if self.disposed.load(Ordering::SeqCst) {
            log::trace!("Timer disposed, ignoring start({:?})", interval);
            return false;
        }
        if let Some(previous) = pending.take() {
            previous.cancel();
        }

        let token = CancellationToken::new();
        *pending = Some(token.clone());

        let callback = Arc::clone(&self.callback);
        let running = Arc::clone(&self.running);
        let disposed = Arc::clone(&self.disposed);
        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }

            let _running = running.lock().await;
            // Re-armed or disposed while waiting for the previous callback
            if token.is_cancelled() || disposed.load(Ordering::SeqCst) {
                return;
            }
            callback().await;
        });

        true
    }

    /// Cancels any pending fire and waits for a running callback to finish.
    ///
    /// No callback starts after this returns.
    pub async fn dispose(&self) {
        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            self.disposed.store(true, Ordering::SeqCst);
            if let Some(token) = pending.take() {
                token.cancel();
            }
        }

        let _running = self.running.lock().await;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// A callback is executing right now (possibly suspended at an await).
    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }
}

impl Drop for SuspendableTimer {
    fn drop(&mut self) {
        self.disposed.store(true, Ordering::SeqCst);
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = pending.take() {
            token.cancel();
        }
    }
}
