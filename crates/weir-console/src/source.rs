//! Push-based in-process log source.
//!
//! [`ChannelLogSource`] lets any part of a program hand entries to the
//! collector without implementing its own stream: callers push entries into
//! an unbounded channel and the collector's forwarding task drains the other
//! end.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use weir_core::{BoxError, CollectorError, LogEntry, LogSource, LogSourceConfig};

use tokio_util::sync::CancellationToken;

/// A source whose entries are pushed by the program itself.
///
/// The entry sequence is non-restartable: the receiving half of the channel
/// is handed out by the first [`entries`](LogSource::entries) call; later
/// calls yield an empty stream.
pub struct ChannelLogSource {
    config: LogSourceConfig,
    tx: Mutex<Option<mpsc::UnboundedSender<LogEntry>>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<LogEntry>>>,
}

impl ChannelLogSource {
    /// Creates a source with the given configuration.
    #[must_use]
    pub fn new(config: LogSourceConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Hands an entry to the source's stream.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::QueueClosed`] once the source has been
    /// closed.
    pub fn push(&self, entry: LogEntry) -> weir_core::Result<()> {
        match self.tx.lock().as_ref() {
            Some(tx) => tx.send(entry).map_err(|_| CollectorError::QueueClosed),
            None => Err(CollectorError::QueueClosed),
        }
    }
}

#[async_trait]
impl LogSource for ChannelLogSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &LogSourceConfig {
        &self.config
    }

    async fn initialize(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
        debug!(source = %self.config.name, "channel source initialized");
        Ok(())
    }

    fn entries(&self) -> BoxStream<'_, Result<LogEntry, BoxError>> {
        match self.rx.lock().take() {
            Some(rx) => futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|entry| (Ok(entry), rx))
            })
            .boxed(),
            None => futures::stream::empty().boxed(),
        }
    }

    fn close(&self) {
        // Dropping the sender ends the stream once buffered entries drain.
        self.tx.lock().take();
        debug!(source = %self.config.name, "channel source closed");
    }
}
