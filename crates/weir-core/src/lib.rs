//! # weir-core
//!
//! Data model and collaborator contracts for the weir log pipeline.
//!
//! This crate provides:
//!
//! - [`LogEntry`] — Immutable structured log records
//! - [`LogSourceConfig`] / [`SourceType`] — Source configuration
//! - [`LogSource`] / [`LogProcessor`] — Contracts for external collaborators
//! - [`LogCollector`] — The façade contract implemented by the buffer core
//! - [`CollectorError`] — Typed failures
//!
//! ## Example
//!
//! ```rust
//! use weir_core::{level, LogEntry};
//!
//! let entry = LogEntry::new(level::WARNING, "slow call", "timing")
//!     .with_class_name("GetUser")
//!     .with_property("ExecutionTimeMs", serde_json::json!(1500.0));
//!
//! assert_eq!(entry.level, "Warning");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export main types
pub use config::{LogSourceConfig, SourceType};
pub use error::{BoxError, CollectorError, Result};
pub use traits::{LogCollector, LogProcessor, LogSource};
pub use types::{level, EntryId, LogEntry};
