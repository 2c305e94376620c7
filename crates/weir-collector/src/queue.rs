//! Bounded drop-oldest entry queue.
//!
//! This module provides:
//! - [`BoundedLogQueue`] — Fixed-capacity FIFO buffer shared by all producers
//! - [`QueueWait`] — Outcome of waiting for entries
//!
//! The queue is the backpressure mechanism of the pipeline: producers never
//! block, and under overload the oldest buffered entry is evicted to make
//! room. A monitoring buffer is more useful showing recent state than
//! stalling its producers, so eviction is a deliberate data-loss contract,
//! not a failure path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use weir_core::{CollectorError, LogEntry, Result};

/// Outcome of [`BoundedLogQueue::wait_for_entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueWait {
    /// At least one entry is available.
    Ready,
    /// The wait was cancelled.
    Cancelled,
    /// The queue is closed and fully drained.
    Closed,
}

/// Fixed-capacity FIFO queue of log entries with a drop-oldest overflow
/// policy.
///
/// Internally synchronized: any number of producers may push concurrently
/// while a single consumer drains. Length never exceeds the configured
/// capacity. Evicted entries are dropped silently, observable only through
/// [`dropped`](Self::dropped).
pub struct BoundedLogQueue {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
    notify: Notify,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl BoundedLogQueue {
    /// Creates a queue holding at most `capacity` entries.
    ///
    /// Capacity must be non-zero; the collector validates this at
    /// construction.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "capacity must be non-zero");
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueues an entry without ever blocking the producer.
    ///
    /// At capacity, the oldest entry is evicted first.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::QueueClosed`] once the queue has been
    /// permanently closed.
    pub fn push(&self, entry: LogEntry) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CollectorError::QueueClosed);
        }

        {
            let mut entries = self.entries.lock();
            if entries.len() == self.capacity {
                entries.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            entries.push_back(entry);
        }

        self.notify.notify_one();
        Ok(())
    }

    /// Removes and returns the oldest entry, if any. Non-blocking.
    #[must_use]
    pub fn try_pop(&self) -> Option<LogEntry> {
        self.entries.lock().pop_front()
    }

    /// Suspends until an entry is available, the token is cancelled, or the
    /// queue is closed with nothing left to drain.
    ///
    /// Cancellation takes priority over available data: a cancelled waiter
    /// observes [`QueueWait::Cancelled`] even while entries remain queued.
    pub async fn wait_for_entries(&self, cancel: &CancellationToken) -> QueueWait {
        loop {
            // Register interest before re-checking state so a push between
            // the check and the await leaves a wakeup permit behind.
            let notified = self.notify.notified();

            if cancel.is_cancelled() {
                return QueueWait::Cancelled;
            }
            if !self.entries.lock().is_empty() {
                return QueueWait::Ready;
            }
            if self.closed.load(Ordering::Acquire) {
                return QueueWait::Closed;
            }

            tokio::select! {
                () = cancel.cancelled() => return QueueWait::Cancelled,
                () = notified => {}
            }
        }
    }

    /// Marks the queue closed. Idempotent.
    ///
    /// Pending pushes fail from here on; waiters observe [`QueueWait::Closed`]
    /// once remaining entries are drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Returns true once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Current number of buffered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no entries are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// The fixed capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries evicted by the drop-oldest policy so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
