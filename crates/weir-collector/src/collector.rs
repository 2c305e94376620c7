//! The collector façade and its source registry.
//!
//! This module provides:
//! - [`CollectorConfig`] — Queue capacity, batch size, failure backoff
//! - [`BufferedLogCollector`] — Registers sources, forwards their entries
//!   into the shared queue, and owns the drain loop's lifetime
//!
//! Every background task the collector starts (the drain loop and one
//! forwarding task per registered source) is held as an explicit
//! `JoinHandle` with its own `CancellationToken`, so `shutdown` can
//! deterministically cancel and join all of them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use weir_core::{CollectorError, LogCollector, LogEntry, LogProcessor, LogSource, Result};

use crate::drain::drain_batches;
use crate::queue::BoundedLogQueue;

/// Tuning knobs for a [`BufferedLogCollector`].
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Maximum number of entries buffered before drop-oldest eviction.
    pub queue_capacity: usize,
    /// Maximum entries per delivered batch.
    pub batch_size: usize,
    /// How long the drain loop pauses after a failed delivery.
    pub failure_backoff: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            batch_size: 100,
            failure_backoff: Duration::from_secs(1),
        }
    }
}

/// A source registered with the collector, together with the handles that
/// control its forwarding task.
struct RegisteredSource {
    source: Arc<dyn LogSource>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Collects logs from multiple sources and hands them to a processor in
/// batches.
///
/// All producers, both per-source forwarding tasks and [`send_log`] callers,
/// feed one [`BoundedLogQueue`]; a singleton drain loop empties it. Must be
/// constructed inside a tokio runtime, since construction spawns the drain
/// loop.
///
/// [`send_log`]: BufferedLogCollector::send_log
pub struct BufferedLogCollector {
    queue: Arc<BoundedLogQueue>,
    processor: Arc<dyn LogProcessor>,
    sources: tokio::sync::Mutex<HashMap<String, RegisteredSource>>,
    drain_cancel: CancellationToken,
    drain_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl BufferedLogCollector {
    /// Creates a collector and starts its drain loop.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::InvalidConfig`] if the queue capacity or
    /// batch size is zero.
    pub fn new(processor: Arc<dyn LogProcessor>, config: CollectorConfig) -> Result<Self> {
        if config.queue_capacity == 0 {
            return Err(CollectorError::InvalidConfig(
                "queue_capacity must be non-zero",
            ));
        }
        if config.batch_size == 0 {
            return Err(CollectorError::InvalidConfig("batch_size must be non-zero"));
        }

        let queue = Arc::new(BoundedLogQueue::new(config.queue_capacity));
        let drain_cancel = CancellationToken::new();
        let drain_task = tokio::spawn(drain_batches(
            Arc::clone(&queue),
            Arc::clone(&processor),
            config.batch_size,
            config.failure_backoff,
            drain_cancel.clone(),
        ));

        Ok(Self {
            queue,
            processor,
            sources: tokio::sync::Mutex::new(HashMap::new()),
            drain_cancel,
            drain_task: parking_lot::Mutex::new(Some(drain_task)),
            disposed: AtomicBool::new(false),
        })
    }

    /// Initializes `source`, registers it, and starts forwarding its entries
    /// into the queue.
    ///
    /// Registration, the initialize call, and the forwarding-task spawn all
    /// happen under the registry guard, so concurrent calls cannot race on a
    /// name and a failed initialize never leaves a registration behind.
    ///
    /// # Errors
    ///
    /// - [`CollectorError::SourceAlreadyActive`] if the name is registered;
    ///   no side effects in that case.
    /// - [`CollectorError::SourceInit`] if the source fails to initialize.
    /// - [`CollectorError::QueueClosed`] after [`shutdown`](Self::shutdown).
    pub async fn start_collecting(
        &self,
        source: Arc<dyn LogSource>,
        cancel: CancellationToken,
    ) -> Result<()> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(CollectorError::QueueClosed);
        }

        let mut sources = self.sources.lock().await;
        // Shutdown may have drained the registry while this call waited for
        // the guard; registering now would leak an unsupervised task.
        if self.disposed.load(Ordering::Acquire) {
            return Err(CollectorError::QueueClosed);
        }

        let name = source.name().to_string();
        if sources.contains_key(&name) {
            return Err(CollectorError::SourceAlreadyActive(name));
        }

        source
            .initialize(cancel.clone())
            .await
            .map_err(|err| CollectorError::SourceInit {
                name: name.clone(),
                source: err,
            })?;

        // Child of the caller's token: cancelling either stops forwarding.
        let task_cancel = cancel.child_token();
        let task = tokio::spawn(forward_entries(
            Arc::clone(&source),
            Arc::clone(&self.queue),
            name.clone(),
            task_cancel.clone(),
        ));

        info!(source = %name, "collection started");
        sources.insert(
            name,
            RegisteredSource {
                source,
                cancel: task_cancel,
                task,
            },
        );
        Ok(())
    }

    /// Stops collecting from the named source and releases it.
    ///
    /// Unknown names are a harmless no-op: the source may already have been
    /// removed or never registered.
    pub async fn stop_collecting(&self, name: &str) -> Result<()> {
        let removed = { self.sources.lock().await.remove(name) };
        if let Some(registered) = removed {
            registered.cancel.cancel();
            if registered.task.await.is_err() {
                warn!(source = %name, "forwarding task panicked");
            }
            registered.source.close();
            info!(source = %name, "collection stopped");
        }
        Ok(())
    }

    /// Snapshot of the currently registered source names, sorted.
    pub async fn active_sources(&self) -> Vec<String> {
        let sources = self.sources.lock().await;
        let mut names: Vec<String> = sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Enqueues an entry directly, then invokes the processor's single-entry
    /// hook so direct sends get immediate observability as well as batched
    /// handling.
    ///
    /// # Errors
    ///
    /// - [`CollectorError::QueueClosed`] after shutdown.
    /// - [`CollectorError::Processor`] if the single-entry hook fails; the
    ///   entry stays queued for batch delivery regardless.
    pub async fn send_log(&self, entry: LogEntry, cancel: CancellationToken) -> Result<()> {
        self.queue.push(entry.clone())?;
        self.processor
            .process_entry(&entry, cancel)
            .await
            .map_err(CollectorError::Processor)
    }

    /// Number of entries evicted by the drop-oldest policy so far.
    #[must_use]
    pub fn dropped_entries(&self) -> u64 {
        self.queue.dropped()
    }

    /// Stops the drain loop and every forwarding task, releasing all
    /// registered sources. Idempotent; later calls are no-ops.
    pub async fn shutdown(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.queue.close();
        self.drain_cancel.cancel();
        let drain = self.drain_task.lock().take();
        if let Some(handle) = drain {
            if handle.await.is_err() {
                warn!("drain loop panicked during shutdown");
            }
        }

        let drained: Vec<(String, RegisteredSource)> =
            { self.sources.lock().await.drain().collect() };
        for (name, registered) in drained {
            registered.cancel.cancel();
            if registered.task.await.is_err() {
                warn!(source = %name, "forwarding task panicked");
            }
            registered.source.close();
        }

        info!("collector shut down");
    }
}

impl Drop for BufferedLogCollector {
    fn drop(&mut self) {
        // Best effort for a collector dropped without shutdown(): cancel
        // everything so no task outlives the queue.
        self.queue.close();
        self.drain_cancel.cancel();
        if let Some(handle) = self.drain_task.lock().take() {
            handle.abort();
        }
        for registered in self.sources.get_mut().values() {
            registered.cancel.cancel();
            registered.task.abort();
        }
    }
}

#[async_trait]
impl LogCollector for BufferedLogCollector {
    async fn start_collecting(
        &self,
        source: Arc<dyn LogSource>,
        cancel: CancellationToken,
    ) -> Result<()> {
        Self::start_collecting(self, source, cancel).await
    }

    async fn stop_collecting(&self, name: &str) -> Result<()> {
        Self::stop_collecting(self, name).await
    }

    async fn active_sources(&self) -> Vec<String> {
        Self::active_sources(self).await
    }

    async fn send_log(&self, entry: LogEntry, cancel: CancellationToken) -> Result<()> {
        Self::send_log(self, entry, cancel).await
    }

    async fn shutdown(&self) {
        Self::shutdown(self).await;
    }
}

/// Moves entries from one source into the shared queue until the source's
/// sequence ends, the token is cancelled, or the queue closes.
///
/// Failure containment: an `Err` item ends only this task. Other sources,
/// the queue, and the drain loop are unaffected, and the source stays
/// registered until `stop_collecting` removes it.
async fn forward_entries(
    source: Arc<dyn LogSource>,
    queue: Arc<BoundedLogQueue>,
    name: String,
    cancel: CancellationToken,
) {
    debug!(source = %name, "forwarding task started");
    let mut entries = source.entries();

    loop {
        let item = tokio::select! {
            () = cancel.cancelled() => {
                debug!(source = %name, "forwarding cancelled");
                break;
            }
            item = entries.next() => item,
        };

        match item {
            Some(Ok(entry)) => {
                if queue.push(entry).is_err() {
                    debug!(source = %name, "queue closed; ending forwarding");
                    break;
                }
            }
            Some(Err(err)) => {
                error!(source = %name, error = %err, "source failed while producing entries");
                break;
            }
            None => {
                debug!(source = %name, "source sequence ended");
                break;
            }
        }
    }
}
