//! Source configuration.
//!
//! This module provides:
//! - [`SourceType`] — Category tag for a log source
//! - [`LogSourceConfig`] — Configuration owned by a concrete source

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Category of a log source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Tails a file on disk.
    File,
    /// Polls a database table.
    Database,
    /// Reads from an interactive console or in-process channel.
    Console,
    /// Queries an Elasticsearch cluster.
    ElasticSearch,
    /// Reads from a cloud log service.
    CloudWatch,
    /// Anything else.
    #[default]
    Custom,
}

/// Configuration for a log source.
///
/// Owned by whoever constructs the concrete source. The collector only ever
/// reads the `name`, which is the registry key and must be unique among
/// currently-active sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSourceConfig {
    /// Registry key; unique among active sources.
    pub name: String,
    /// Category tag.
    pub source_type: SourceType,
    /// Backend-specific connection settings.
    #[serde(default)]
    pub connection_settings: HashMap<String, String>,
    /// Suggested internal buffer size for the source.
    pub buffer_size: usize,
    /// Suggested flush interval for the source.
    pub flush_interval: Duration,
}

impl LogSourceConfig {
    /// Creates a configuration with default buffering settings.
    #[must_use]
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            source_type,
            connection_settings: HashMap::new(),
            buffer_size: 1000,
            flush_interval: Duration::from_secs(5),
        }
    }

    /// Adds a connection setting.
    #[must_use]
    pub fn with_connection_setting(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.connection_settings.insert(key.into(), value.into());
        self
    }

    /// Sets the buffer size.
    #[must_use]
    pub const fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Sets the flush interval.
    #[must_use]
    pub const fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }
}
