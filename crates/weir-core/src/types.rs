//! Core types for the log pipeline.
//!
//! This module provides:
//! - [`EntryId`] — Process-unique identifier for log entries
//! - [`LogEntry`] — Immutable structured log record
//! - [`level`] — Conventional severity vocabulary

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Conventional severity labels.
///
/// Severity is a free-form string by contract: producers and processors only
/// need to agree on the vocabulary. These constants are the vocabulary used
/// by the crates in this workspace.
pub mod level {
    /// Routine operational information.
    pub const INFORMATION: &str = "Information";
    /// Something worth attention but not failing.
    pub const WARNING: &str = "Warning";
    /// A failure.
    pub const ERROR: &str = "Error";
}

/// Process-unique identifier for a log entry, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A single log record flowing through the pipeline.
///
/// Entries are immutable once constructed: the queue and processors only ever
/// read them. The `id` and `timestamp` are assigned by [`LogEntry::new`], so
/// no two entries share an identity even when their content is equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier, generated at creation.
    pub id: EntryId,
    /// Creation time (UTC).
    pub timestamp: DateTime<Utc>,
    /// Severity label (see [`level`]).
    pub level: String,
    /// The log message.
    pub message: String,
    /// Name of the origin source or subsystem.
    pub source: String,
    /// Error message, if the entry describes a failure.
    pub exception: Option<String>,
    /// Stack trace accompanying `exception`.
    pub stack_trace: Option<String>,
    /// Name of the producing application.
    pub application_name: Option<String>,
    /// Deployment environment of the producer.
    pub environment: Option<String>,
    /// Class or operation name the entry relates to.
    pub class_name: Option<String>,
    /// How long the logged operation took.
    pub execution_time: Option<Duration>,
    /// Ordered structured context.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Creates a new entry with a fresh id and the current UTC timestamp.
    #[must_use]
    pub fn new(
        level: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            timestamp: Utc::now(),
            level: level.into(),
            message: message.into(),
            source: source.into(),
            exception: None,
            stack_trace: None,
            application_name: None,
            environment: None,
            class_name: None,
            execution_time: None,
            properties: BTreeMap::new(),
        }
    }

    /// Sets the exception message.
    #[must_use]
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Sets the stack trace.
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Sets the application name.
    #[must_use]
    pub fn with_application_name(mut self, application_name: impl Into<String>) -> Self {
        self.application_name = Some(application_name.into());
        self
    }

    /// Sets the environment.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Sets the class or operation name.
    #[must_use]
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Sets the execution time.
    #[must_use]
    pub const fn with_execution_time(mut self, execution_time: Duration) -> Self {
        self.execution_time = Some(execution_time);
        self
    }

    /// Adds a structured context property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}
