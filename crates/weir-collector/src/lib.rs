//! # weir-collector
//!
//! Bounded drop-oldest buffering and batch draining for the weir log
//! pipeline.
//!
//! This crate provides:
//!
//! - [`BoundedLogQueue`] — Fixed-capacity FIFO buffer with a drop-oldest
//!   overflow policy
//! - [`BufferedLogCollector`] — Façade that registers sources, forwards
//!   their entries into the queue, and delivers fixed-size batches to a
//!   processor from a supervised background loop
//! - [`CollectorConfig`] — Capacity, batch size, and failure backoff knobs
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use weir_collector::{BufferedLogCollector, CollectorConfig};
//! use weir_core::{level, LogEntry, LogProcessor};
//!
//! # async fn run(processor: Arc<dyn LogProcessor>) -> weir_core::Result<()> {
//! let collector = BufferedLogCollector::new(processor, CollectorConfig::default())?;
//!
//! let entry = LogEntry::new(level::INFORMATION, "started", "app");
//! collector.send_log(entry, CancellationToken::new()).await?;
//!
//! collector.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collector;
mod drain;
pub mod queue;

// Re-export main types
pub use collector::{BufferedLogCollector, CollectorConfig};
pub use queue::{BoundedLogQueue, QueueWait};
