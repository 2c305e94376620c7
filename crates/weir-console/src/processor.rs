//! Console log processor.
//!
//! Prints entries to stdout, colored by severity. Formatting is split from
//! printing so the rendered text is testable.

use async_trait::async_trait;
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use weir_core::{level, BoxError, LogEntry, LogProcessor};

/// A processor that renders entries to stdout.
///
/// Error entries get a multi-line block with the failure details; everything
/// else is a single line. Batch delivery prints each entry in order.
pub struct ConsoleLogProcessor {
    colored: bool,
}

impl Default for ConsoleLogProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogProcessor {
    /// Creates a processor with colored output.
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Creates a processor that never emits color codes.
    #[must_use]
    pub const fn plain() -> Self {
        Self { colored: false }
    }

    /// Renders one entry to text, without color.
    #[must_use]
    pub fn format_entry(entry: &LogEntry) -> String {
        let subject = entry.class_name.as_deref().unwrap_or(&entry.source);

        if entry.level == level::ERROR {
            let mut lines = format!("ERROR in {subject}: {}", entry.message);
            if let Some(location) = entry.properties.get("ExceptionLocation") {
                lines.push_str(&format!("\n  location: {location}"));
            }
            if let Some(exception) = &entry.exception {
                lines.push_str(&format!("\n  cause: {exception}"));
            }
            if let Some(execution_time) = entry.execution_time {
                lines.push_str(&format!(
                    "\n  took: {:.2}ms",
                    execution_time.as_secs_f64() * 1000.0
                ));
            }
            return lines;
        }

        let mut line = format!("[{}] {subject}: {}", entry.level, entry.message);
        if let Some(execution_time) = entry.execution_time {
            line.push_str(&format!(
                " ({:.2}ms)",
                execution_time.as_secs_f64() * 1000.0
            ));
        }
        line
    }

    fn print(&self, entry: &LogEntry) {
        let text = Self::format_entry(entry);
        if !self.colored {
            println!("{text}");
            return;
        }
        match entry.level.as_str() {
            level::ERROR => println!("{}", text.red()),
            level::WARNING => println!("{}", text.yellow()),
            level::INFORMATION => println!("{}", text.green()),
            _ => println!("{text}"),
        }
    }
}

#[async_trait]
impl LogProcessor for ConsoleLogProcessor {
    async fn process_entry(
        &self,
        entry: &LogEntry,
        _cancel: CancellationToken,
    ) -> Result<(), BoxError> {
        self.print(entry);
        Ok(())
    }

    async fn process_batch(
        &self,
        entries: &[LogEntry],
        cancel: CancellationToken,
    ) -> Result<(), BoxError> {
        for entry in entries {
            self.process_entry(entry, cancel.clone()).await?;
        }
        Ok(())
    }
}
