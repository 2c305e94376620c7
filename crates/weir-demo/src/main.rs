//! weir-demo - End-to-end demo of the weir log pipeline.
//!
//! This binary wires a `ChannelLogSource` and a `ConsoleLogProcessor` into a
//! `BufferedLogCollector`, generates a stream of synthetic entries, and
//! demonstrates direct sends and call timing. Press ctrl-c to stop early.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weir_collector::{BufferedLogCollector, CollectorConfig};
use weir_console::{ChannelLogSource, ConsoleLogProcessor};
use weir_core::{level, LogCollector, LogEntry, LogProcessor, LogSource, LogSourceConfig, SourceType};
use weir_timing::{CallTimer, TimingOptions};

#[derive(Parser)]
#[command(name = "weir-demo")]
#[command(about = "Demo of the weir buffered log collector")]
#[command(version)]
struct Cli {
    /// Number of synthetic entries to generate
    #[arg(long, default_value_t = 25)]
    entries: u32,

    /// Delay between generated entries, in milliseconds
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Queue capacity before drop-oldest eviction kicks in
    #[arg(long, default_value_t = 1000)]
    queue_capacity: usize,

    /// Maximum entries per delivered batch
    #[arg(long, default_value_t = 100)]
    batch_size: usize,

    /// Disable colored console output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("weir=info".parse()?))
        .init();

    let cli = Cli::parse();

    let processor: Arc<dyn LogProcessor> = if cli.no_color {
        Arc::new(ConsoleLogProcessor::plain())
    } else {
        Arc::new(ConsoleLogProcessor::new())
    };

    let collector = Arc::new(BufferedLogCollector::new(
        processor,
        CollectorConfig {
            queue_capacity: cli.queue_capacity,
            batch_size: cli.batch_size,
            failure_backoff: Duration::from_secs(1),
        },
    )?);

    let source = Arc::new(ChannelLogSource::new(LogSourceConfig::new(
        "console",
        SourceType::Console,
    )));
    collector
        .start_collecting(
            Arc::clone(&source) as Arc<dyn LogSource>,
            CancellationToken::new(),
        )
        .await?;
    info!(sources = ?collector.active_sources().await, "collection started");

    let cancel = CancellationToken::new();
    let generator = tokio::spawn(generate_entries(
        Arc::clone(&source),
        cli.entries,
        Duration::from_millis(cli.interval_ms),
        cancel.clone(),
    ));

    demo_call_timing(Arc::clone(&collector) as Arc<dyn LogCollector>).await;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received; shutting down");
            cancel.cancel();
        }
        result = generator => {
            if result.is_err() {
                warn!("entry generator panicked");
            }
            // Give the drain loop a moment to flush the tail of the queue.
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    let dropped = collector.dropped_entries();
    if dropped > 0 {
        warn!(dropped, "entries evicted under backpressure");
    }

    collector.stop_collecting("console").await?;
    collector.shutdown().await;
    info!("done");
    Ok(())
}

/// Pushes a mix of severities into the source at a fixed cadence.
async fn generate_entries(
    source: Arc<ChannelLogSource>,
    count: u32,
    interval: Duration,
    cancel: CancellationToken,
) {
    for i in 0..count {
        let entry = match i % 7 {
            0 => LogEntry::new(level::WARNING, format!("slow request #{i}"), "console")
                .with_class_name("RequestHandler")
                .with_execution_time(Duration::from_millis(1500)),
            3 => LogEntry::new(level::ERROR, format!("request #{i} failed"), "console")
                .with_class_name("RequestHandler")
                .with_exception("connection reset by peer")
                .with_property("Attempt", serde_json::json!(i % 3 + 1)),
            _ => LogEntry::new(level::INFORMATION, format!("request #{i} handled"), "console")
                .with_class_name("RequestHandler")
                .with_property("RequestId", serde_json::json!(i)),
        };

        if source.push(entry).is_err() {
            break;
        }

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }
}

/// Runs three instrumented calls: one fast, one over the slow threshold, one
/// failing.
async fn demo_call_timing(collector: Arc<dyn LogCollector>) {
    let timer = CallTimer::with_options(
        collector,
        TimingOptions {
            slow_threshold: Duration::from_millis(50),
            include_error_details: true,
        },
    );

    let fast: Result<u32, std::io::Error> = timer
        .measure("lookup_user", CancellationToken::new(), async { Ok(42) })
        .await;
    if let Ok(value) = fast {
        info!(value, "fast call finished");
    }

    let slow: Result<(), std::io::Error> = timer
        .measure("rebuild_index", CancellationToken::new(), async {
            tokio::time::sleep(Duration::from_millis(120)).await;
            Ok(())
        })
        .await;
    if slow.is_ok() {
        info!("slow call finished");
    }

    let failed: Result<(), std::io::Error> = timer
        .measure("flush_cache", CancellationToken::new(), async {
            Err(std::io::Error::other("cache node unreachable"))
        })
        .await;
    if failed.is_err() {
        info!("failing call reported");
    }
}
