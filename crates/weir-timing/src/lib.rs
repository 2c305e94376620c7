//! # weir-timing
//!
//! Call-timing instrumentation for the weir log pipeline.
//!
//! [`CallTimer`] wraps a future, measures how long it takes, classifies the
//! outcome (fast success is Information, slow success is Warning, failure is
//! Error), and direct-sends a [`LogEntry`] through any [`LogCollector`]. The
//! measured call's own result is always returned unchanged: instrumentation
//! never swallows a value or an error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use weir_core::LogCollector;
//! use weir_timing::CallTimer;
//!
//! # async fn run(collector: Arc<dyn LogCollector>) {
//! let timer = CallTimer::new(collector);
//! let result: Result<u32, std::io::Error> = timer
//!     .measure("load_user", CancellationToken::new(), async { Ok(42) })
//!     .await;
//! # let _ = result;
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use weir_core::{level, LogCollector, LogEntry};

/// Source name stamped on every entry produced by a [`CallTimer`].
pub const TIMER_SOURCE: &str = "call-timer";

/// Tuning knobs for [`CallTimer`].
#[derive(Debug, Clone)]
pub struct TimingOptions {
    /// Successful calls slower than this are logged as Warning.
    pub slow_threshold: Duration,
    /// Whether failure entries carry the error message.
    pub include_error_details: bool,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            slow_threshold: Duration::from_secs(1),
            include_error_details: true,
        }
    }
}

/// Times operations and reports them through a collector's direct-send path.
pub struct CallTimer<C: ?Sized> {
    collector: Arc<C>,
    options: TimingOptions,
}

impl<C: LogCollector + ?Sized> CallTimer<C> {
    /// Creates a timer with default options.
    #[must_use]
    pub fn new(collector: Arc<C>) -> Self {
        Self {
            collector,
            options: TimingOptions::default(),
        }
    }

    /// Creates a timer with explicit options.
    #[must_use]
    pub fn with_options(collector: Arc<C>, options: TimingOptions) -> Self {
        Self { collector, options }
    }

    /// Runs `call`, times it, and direct-sends one entry describing the
    /// outcome.
    ///
    /// A failed [`send_log`](LogCollector::send_log) is logged and swallowed:
    /// instrumentation must never turn a successful call into a failure.
    ///
    /// # Errors
    ///
    /// Returns whatever error `call` itself produced, unchanged.
    pub async fn measure<T, E, F>(
        &self,
        operation: &str,
        cancel: CancellationToken,
        call: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>> + Send,
        E: std::fmt::Display,
    {
        let started = Instant::now();
        let outcome = call.await;
        let elapsed = started.elapsed();

        let entry = match &outcome {
            Ok(_) => self.success_entry(operation, elapsed),
            Err(err) => self.failure_entry(operation, elapsed, err),
        };

        if let Err(send_err) = self.collector.send_log(entry, cancel).await {
            warn!(operation, error = %send_err, "failed to report call timing");
        }

        outcome
    }

    fn success_entry(&self, operation: &str, elapsed: Duration) -> LogEntry {
        let millis = elapsed.as_secs_f64() * 1000.0;
        let level = if elapsed > self.options.slow_threshold {
            level::WARNING
        } else {
            level::INFORMATION
        };

        LogEntry::new(level, format!("{operation} - {millis:.2}ms"), TIMER_SOURCE)
            .with_class_name(operation)
            .with_execution_time(elapsed)
            .with_property("ExecutionTimeMs", serde_json::json!(millis))
    }

    fn failure_entry<E: std::fmt::Display>(
        &self,
        operation: &str,
        elapsed: Duration,
        err: &E,
    ) -> LogEntry {
        let millis = elapsed.as_secs_f64() * 1000.0;
        let mut entry = LogEntry::new(
            level::ERROR,
            format!("Error in {operation} - {millis:.2}ms"),
            TIMER_SOURCE,
        )
        .with_class_name(operation)
        .with_execution_time(elapsed)
        .with_property("ExecutionTimeMs", serde_json::json!(millis))
        .with_property(
            "ErrorType",
            serde_json::json!(std::any::type_name::<E>()),
        );

        if self.options.include_error_details {
            entry = entry.with_exception(err.to_string());
        }
        entry
    }
}
