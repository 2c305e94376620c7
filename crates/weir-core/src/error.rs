//! Error types for the log pipeline.

use thiserror::Error;

/// Boxed error type used at the collaborator seams.
///
/// Sources and processors are implemented outside this workspace; their
/// failures cross the trait boundary as boxed errors and the collector wraps
/// them into [`CollectorError`] where they propagate to a caller.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the collector and its queue.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The collector was constructed with an unusable configuration.
    #[error("invalid collector configuration: {0}")]
    InvalidConfig(&'static str),

    /// A source with the same name is already registered.
    #[error("source {0} is already active")]
    SourceAlreadyActive(String),

    /// The queue (or the collector owning it) has been closed.
    #[error("log queue is closed")]
    QueueClosed,

    /// A source failed to initialize; nothing was registered.
    #[error("source {name} failed to initialize")]
    SourceInit {
        /// Name of the source that failed.
        name: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },

    /// The processor rejected a directly-sent entry.
    #[error("processor failed")]
    Processor(#[source] BoxError),
}

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;
