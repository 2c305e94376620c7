//! Collaborator contracts consumed by the collector.
//!
//! This module provides:
//! - [`LogSource`] — A live, cancellable stream of entries
//! - [`LogProcessor`] — A sink for single entries and batches
//! - [`LogCollector`] — The façade contract implemented by the buffer core
//!
//! Concrete sources and processors live outside the core; the collector only
//! ever talks to them through these traits.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::config::{LogSourceConfig, SourceType};
use crate::error::{BoxError, Result};
use crate::types::LogEntry;

/// A producer of log entries.
///
/// The collector calls [`initialize`](Self::initialize) exactly once before
/// collection begins, then consumes [`entries`](Self::entries) from a
/// dedicated forwarding task until the stream ends or the task is cancelled.
/// [`close`](Self::close) is called at most once when the source is
/// unregistered or the collector shuts down.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Stable identity, used as the registry key.
    fn name(&self) -> &str;

    /// Category tag.
    fn source_type(&self) -> SourceType {
        self.config().source_type
    }

    /// The configuration this source was built from.
    fn config(&self) -> &LogSourceConfig;

    /// Prepares the source for collection.
    ///
    /// Must be atomic: either the source is fully ready afterwards, or it
    /// failed and left no partial state behind. The collector registers the
    /// source only after this succeeds.
    async fn initialize(&self, cancel: CancellationToken) -> std::result::Result<(), BoxError>;

    /// Returns the lazy, potentially infinite sequence of entries.
    ///
    /// The sequence is not restartable; the collector calls this once per
    /// registration. An `Err` item signals a source failure and ends the
    /// forwarding task for this source.
    fn entries(&self) -> BoxStream<'_, std::result::Result<LogEntry, BoxError>>;

    /// Releases the source's resources. Idempotent.
    fn close(&self);
}

/// A consumer of log entries.
#[async_trait]
pub trait LogProcessor: Send + Sync {
    /// Handles a single, directly-sent entry.
    async fn process_entry(
        &self,
        entry: &LogEntry,
        cancel: CancellationToken,
    ) -> std::result::Result<(), BoxError>;

    /// Handles a batch formed by the drain loop.
    async fn process_batch(
        &self,
        entries: &[LogEntry],
        cancel: CancellationToken,
    ) -> std::result::Result<(), BoxError>;
}

/// The collector façade.
///
/// Instrumentation layers depend on this contract rather than on a concrete
/// collector, so they can be wired against anything that buffers entries.
#[async_trait]
pub trait LogCollector: Send + Sync {
    /// Initializes and registers a source, then starts forwarding its
    /// entries.
    ///
    /// Fails with [`CollectorError::SourceAlreadyActive`] if a source with
    /// the same name is active, without side effects.
    ///
    /// [`CollectorError::SourceAlreadyActive`]: crate::error::CollectorError::SourceAlreadyActive
    async fn start_collecting(
        &self,
        source: Arc<dyn LogSource>,
        cancel: CancellationToken,
    ) -> Result<()>;

    /// Stops forwarding from the named source and releases it.
    ///
    /// Unknown names are a harmless no-op.
    async fn stop_collecting(&self, name: &str) -> Result<()>;

    /// Snapshot of currently registered source names.
    async fn active_sources(&self) -> Vec<String>;

    /// Enqueues an entry directly, then hands it to the processor's
    /// single-entry hook.
    async fn send_log(&self, entry: LogEntry, cancel: CancellationToken) -> Result<()>;

    /// Stops the drain loop and every forwarding task, releasing all
    /// registered sources. Idempotent.
    async fn shutdown(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::level;
    use futures::StreamExt;
    use parking_lot::Mutex;

    struct StaticSource {
        config: LogSourceConfig,
        items: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl LogSource for StaticSource {
        fn name(&self) -> &str {
            &self.config.name
        }

        fn config(&self) -> &LogSourceConfig {
            &self.config
        }

        async fn initialize(
            &self,
            _cancel: CancellationToken,
        ) -> std::result::Result<(), BoxError> {
            Ok(())
        }

        fn entries(&self) -> BoxStream<'_, std::result::Result<LogEntry, BoxError>> {
            let items: Vec<_> = self.items.lock().drain(..).map(Ok).collect();
            futures::stream::iter(items).boxed()
        }

        fn close(&self) {}
    }

    #[tokio::test]
    async fn source_trait_is_object_safe() {
        let source: Arc<dyn LogSource> = Arc::new(StaticSource {
            config: LogSourceConfig::new("static", SourceType::Custom),
            items: Mutex::new(vec![LogEntry::new(level::INFORMATION, "one", "static")]),
        });

        assert_eq!(source.name(), "static");
        assert_eq!(source.source_type(), SourceType::Custom);

        let collected: Vec<_> = source.entries().collect().await;
        assert_eq!(collected.len(), 1);
        assert!(collected[0].is_ok());

        // Non-restartable: a second call yields nothing.
        let rest: Vec<_> = source.entries().collect().await;
        assert!(rest.is_empty());
    }

    struct CountingProcessor {
        entries: Mutex<usize>,
        batches: Mutex<usize>,
    }

    #[async_trait]
    impl LogProcessor for CountingProcessor {
        async fn process_entry(
            &self,
            _entry: &LogEntry,
            _cancel: CancellationToken,
        ) -> std::result::Result<(), BoxError> {
            *self.entries.lock() += 1;
            Ok(())
        }

        async fn process_batch(
            &self,
            entries: &[LogEntry],
            _cancel: CancellationToken,
        ) -> std::result::Result<(), BoxError> {
            *self.batches.lock() += entries.len();
            Ok(())
        }
    }

    #[tokio::test]
    async fn processor_trait_is_object_safe() {
        let processor: Arc<dyn LogProcessor> = Arc::new(CountingProcessor {
            entries: Mutex::new(0),
            batches: Mutex::new(0),
        });

        let entry = LogEntry::new(level::INFORMATION, "m", "s");
        let cancel = CancellationToken::new();

        processor
            .process_entry(&entry, cancel.clone())
            .await
            .expect("entry accepted");
        processor
            .process_batch(std::slice::from_ref(&entry), cancel)
            .await
            .expect("batch accepted");
    }
}
