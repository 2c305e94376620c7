//! # weir-console
//!
//! Console-oriented collaborators for the weir log pipeline.
//!
//! This crate provides:
//!
//! - [`ChannelLogSource`] — A push-based source backed by an in-process
//!   channel
//! - [`ConsoleLogProcessor`] — A processor that prints entries to stdout,
//!   colored by severity

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod processor;
pub mod source;

// Re-export main types
pub use processor::ConsoleLogProcessor;
pub use source::ChannelLogSource;
