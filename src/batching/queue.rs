//! Ingestion queue between producers and the scheduler.
//!
//! Backed by an unbounded Tokio channel: any number of producers push without
//! ever waiting, and exactly one [`QueueDrain`] pops. The drain is owned by
//! the tick state, so the single-consumer rule is enforced by ownership.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError};

/// Producer half. Cheap to clone, safe to share across threads.
#[derive(Debug)]
pub struct IngestionQueue<T> {
    sender: mpsc::UnboundedSender<T>,
    queued: Arc<AtomicUsize>,
}

impl<T> Clone for IngestionQueue<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            queued: Arc::clone(&self.queued),
        }
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct QueueDrain<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    queued: Arc<AtomicUsize>,
}

/// Creates a connected producer/consumer pair.
pub fn ingestion_queue<T>() -> (IngestionQueue<T>, QueueDrain<T>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let queued = Arc::new(AtomicUsize::new(0));
    (
        IngestionQueue {
            sender,
            queued: Arc::clone(&queued),
        },
        QueueDrain { receiver, queued },
    )
}

impl<T> IngestionQueue<T> {
    /// Appends a record. Never blocks.
    ///
    /// Returns `false` if the consumer is gone, in which case the record is
    /// dropped.
    pub fn enqueue(&self, record: T) -> bool {
        // Counted before the send so a racing dequeue never underflows
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(record).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Records sent but not yet taken by the consumer.
    ///
    /// Readable while the consumer is busy, so it may lag a concurrent dequeue.
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> QueueDrain<T> {
    /// Pops the oldest record if one is available.
    pub fn try_dequeue(&mut self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(record) => {
                self.queued.fetch_sub(1, Ordering::SeqCst);
                Some(record)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Moves records into `batch` until it holds `limit` records or the queue is empty.
    pub fn fill(&mut self, batch: &mut Vec<T>, limit: usize) {
        while batch.len() < limit {
            match self.try_dequeue() {
                Some(record) => batch.push(record),
                None => break,
            }
        }
    }

    /// Discards every queued record, returning how many were dropped.
    pub fn drain_discard(&mut self) -> usize {
        let mut dropped = 0;
        while self.try_dequeue().is_some() {
            dropped += 1;
        }
        dropped
    }

    /// Number of records currently waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
