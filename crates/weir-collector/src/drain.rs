//! Batch drain loop.
//!
//! A singleton background task that converts queued entries into batches and
//! delivers them to the processor, independent of producer timing. Greedy
//! drain-then-deliver bounds both latency (never waits past the first
//! available entry) and memory per delivery (at most `batch_size` entries).

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use weir_core::LogProcessor;

use crate::queue::{BoundedLogQueue, QueueWait};

/// Runs until cancelled (or until the queue is closed and drained at
/// teardown).
///
/// Cancellation exits immediately, even with entries still queued: whatever
/// remains is dropped with the queue at teardown, never flushed.
///
/// A failed delivery is logged and its batch discarded (stale logs are not
/// worth re-processing), then the loop backs off for `failure_backoff` so a
/// persistently failing processor cannot spin the loop hot. A single
/// processor failure never terminates background processing.
pub(crate) async fn drain_batches(
    queue: Arc<BoundedLogQueue>,
    processor: Arc<dyn LogProcessor>,
    batch_size: usize,
    failure_backoff: Duration,
    cancel: CancellationToken,
) {
    debug!(batch_size, "batch drain loop started");
    let mut batch = Vec::with_capacity(batch_size);

    loop {
        match queue.wait_for_entries(&cancel).await {
            QueueWait::Ready => {}
            QueueWait::Cancelled | QueueWait::Closed => break,
        }

        while batch.len() < batch_size {
            match queue.try_pop() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }

        if batch.is_empty() {
            continue;
        }

        if let Err(err) = processor.process_batch(&batch, cancel.clone()).await {
            warn!(
                error = %err,
                discarded = batch.len(),
                "batch delivery failed; discarding batch and backing off"
            );
            batch.clear();
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(failure_backoff) => {}
            }
            continue;
        }

        debug!(delivered = batch.len(), "batch delivered");
        batch.clear();
    }

    debug!("batch drain loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use weir_core::{level, BoxError, LogEntry};

    struct RecordingProcessor {
        batches: Mutex<Vec<Vec<String>>>,
        fail_next: AtomicUsize,
        failures: AtomicUsize,
    }

    impl RecordingProcessor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                batches: Mutex::new(Vec::new()),
                fail_next: AtomicUsize::new(0),
                failures: AtomicUsize::new(0),
            })
        }

        fn delivered(&self) -> Vec<Vec<String>> {
            self.batches.lock().clone()
        }

        fn total_delivered(&self) -> usize {
            self.batches.lock().iter().map(Vec::len).sum()
        }
    }

    #[async_trait]
    impl weir_core::LogProcessor for RecordingProcessor {
        async fn process_entry(
            &self,
            _entry: &LogEntry,
            _cancel: CancellationToken,
        ) -> Result<(), BoxError> {
            Ok(())
        }

        async fn process_batch(
            &self,
            entries: &[LogEntry],
            _cancel: CancellationToken,
        ) -> Result<(), BoxError> {
            if self.fail_next.load(Ordering::Acquire) > 0 {
                self.fail_next.fetch_sub(1, Ordering::AcqRel);
                self.failures.fetch_add(1, Ordering::AcqRel);
                return Err("synthetic processor failure".into());
            }
            self.batches
                .lock()
                .push(entries.iter().map(|e| e.message.clone()).collect());
            Ok(())
        }
    }

    fn entry(message: &str) -> LogEntry {
        LogEntry::new(level::INFORMATION, message, "test")
    }

    async fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let result = tokio::time::timeout(deadline, async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        result.is_ok()
    }

    #[tokio::test]
    async fn prefilled_queue_drains_into_ceiling_batches() {
        // N = 10 entries, B = 4: expect ceil(10/4) = 3 batches of 4, 4, 2.
        let queue = Arc::new(BoundedLogQueue::new(100));
        for i in 0..10 {
            queue.push(entry(&format!("m{i}"))).expect("open queue");
        }

        let processor = RecordingProcessor::new();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(drain_batches(
            Arc::clone(&queue),
            Arc::clone(&processor) as Arc<dyn weir_core::LogProcessor>,
            4,
            Duration::from_secs(1),
            cancel.clone(),
        ));

        assert!(
            wait_until(Duration::from_secs(2), || processor.total_delivered() == 10).await,
            "all entries delivered"
        );
        cancel.cancel();
        task.await.expect("drain task completed");

        let batches = processor.delivered();
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);

        let flattened: Vec<String> = batches.into_iter().flatten().collect();
        let expected: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
        assert_eq!(flattened, expected);
    }

    #[tokio::test]
    async fn failed_batch_is_discarded_and_loop_recovers() {
        let queue = Arc::new(BoundedLogQueue::new(100));
        queue.push(entry("doomed")).expect("open queue");

        let processor = RecordingProcessor::new();
        processor.fail_next.store(1, Ordering::Release);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(drain_batches(
            Arc::clone(&queue),
            Arc::clone(&processor) as Arc<dyn weir_core::LogProcessor>,
            10,
            Duration::from_millis(20),
            cancel.clone(),
        ));

        assert!(
            wait_until(Duration::from_secs(2), || {
                processor.failures.load(Ordering::Acquire) == 1
            })
            .await,
            "first batch failed"
        );

        // A batch enqueued after the failure is delivered once the backoff
        // elapses; the discarded entry is never retried.
        queue.push(entry("survivor")).expect("open queue");
        assert!(
            wait_until(Duration::from_secs(2), || processor.total_delivered() == 1).await,
            "loop recovered after backoff"
        );

        cancel.cancel();
        task.await.expect("drain task completed");

        assert_eq!(processor.delivered(), vec![vec!["survivor".to_string()]]);
    }

    #[tokio::test]
    async fn cancelled_loop_does_not_flush_a_prefilled_queue() {
        let queue = Arc::new(BoundedLogQueue::new(100));
        for i in 0..8 {
            queue.push(entry(&format!("m{i}"))).expect("open queue");
        }

        let processor = RecordingProcessor::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        drain_batches(
            Arc::clone(&queue),
            Arc::clone(&processor) as Arc<dyn weir_core::LogProcessor>,
            4,
            Duration::from_secs(1),
            cancel,
        )
        .await;

        // Queued entries are left behind, not delivered.
        assert_eq!(processor.total_delivered(), 0);
        assert_eq!(queue.len(), 8);
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop_without_flushing() {
        let queue = Arc::new(BoundedLogQueue::new(100));
        let processor = RecordingProcessor::new();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(drain_batches(
            Arc::clone(&queue),
            Arc::clone(&processor) as Arc<dyn weir_core::LogProcessor>,
            4,
            Duration::from_secs(1),
            cancel.clone(),
        ));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("loop exited promptly")
            .expect("drain task completed");

        // Entries arriving after cancellation stay in the queue.
        queue.push(entry("left behind")).expect("open queue");
        assert_eq!(processor.total_delivered(), 0);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn closed_and_drained_queue_ends_the_loop() {
        let queue = Arc::new(BoundedLogQueue::new(100));
        let processor = RecordingProcessor::new();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(drain_batches(
            Arc::clone(&queue),
            Arc::clone(&processor) as Arc<dyn weir_core::LogProcessor>,
            4,
            Duration::from_secs(1),
            cancel,
        ));

        queue.close();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("loop exited on close")
            .expect("drain task completed");
    }
}
