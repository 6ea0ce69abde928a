//! Batching target: buffer, flush, retry and fallback
//!
//! A [`BatchingTarget`] accepts records one at a time into an unbounded
//! FIFO buffer. Once the buffer holds `threshold` records the whole buffer
//! is drained into a batch and handed to its [`BatchSink`]. A failed
//! delivery is retried up to `max_retries` times, sleeping
//! [`BatchingTarget::get_delay`] between attempts. When retries run out the
//! whole batch goes to the fallback target, or is reported lost when there
//! is none.
//!
//! Draining and delivery are single-flight per target: one async mutex is
//! held from the moment the buffer is drained until the batch is delivered,
//! handed to the fallback, or dropped. Batches therefore leave a target in
//! the order their records were accepted.
//!
//! Fallback chains must be acyclic. A target reached again through its own
//! fallback chain waits on its own flush gate forever.

use super::config::{BatchConfig, BatchSettings};
use super::diagnostics::{stderr_diagnostics, Diagnostic, DiagnosticCallback};
use super::error::{LoggerError, Result};
use super::metrics::PipelineMetrics;
use super::record::LogRecord;
use super::target::{BatchSink, BatchTarget, Target};
use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// A target that delivers records to a [`BatchSink`] in groups
///
/// # Example
///
/// ```
/// use rust_log_facade::prelude::*;
/// use rust_log_facade::targets::{MemorySink, MemoryTarget};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let sink = MemorySink::new();
/// let target = BatchingTarget::new(sink.clone(), BatchConfig::new().max_size(2))?
///     .with_fallback(Arc::new(MemoryTarget::new()));
///
/// target.log(Arc::new(LogRecord::new("app", LogLevel::Information, "first"))).await?;
/// assert!(sink.is_empty());
///
/// target.log(Arc::new(LogRecord::new("app", LogLevel::Information, "second"))).await?;
/// assert_eq!(sink.messages(), vec!["first", "second"]);
/// # Ok::<(), LoggerError>(())
/// # }).unwrap();
/// ```
pub struct BatchingTarget<S: BatchSink> {
    name: String,
    sink: S,
    sender: Sender<Arc<LogRecord>>,
    receiver: Receiver<Arc<LogRecord>>,
    flush_gate: Mutex<()>,
    settings: BatchSettings,
    fallback: Option<Arc<dyn Target>>,
    diagnostics: DiagnosticCallback,
    metrics: Arc<PipelineMetrics>,
}

impl<S: BatchSink + 'static> BatchingTarget<S> {
    /// Create a batching target, validating `config`
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] when the threshold is
    /// below 2 or the retry delay is negative.
    pub fn new(sink: S, config: BatchConfig) -> Result<Self> {
        let settings = config.validate()?;
        Ok(Self::with_settings(sink, settings))
    }

    /// Create a batching target from already validated settings
    pub fn with_settings(sink: S, settings: BatchSettings) -> Self {
        let (sender, receiver) = unbounded();

        Self {
            name: sink.name().to_string(),
            sink,
            sender,
            receiver,
            flush_gate: Mutex::new(()),
            settings,
            fallback: None,
            diagnostics: stderr_diagnostics(),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Target that receives batches this one could not deliver
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn Target>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Channel receiving retry, fallback and loss notifications
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticCallback) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Override the name used in diagnostics (defaults to the sink name)
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn fallback(&self) -> Option<&Arc<dyn Target>> {
        self.fallback.as_ref()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Number of records waiting in the buffer
    pub fn buffered(&self) -> usize {
        self.receiver.len()
    }

    /// Delay after failed attempt number `attempt` (1-based)
    pub fn get_delay(&self, attempt: u32) -> Duration {
        self.settings.delay_for(attempt)
    }

    /// Buffer a record and flush when the threshold is reached
    ///
    /// `None` is accepted and ignored, so callers holding an optional record
    /// need not check it first.
    pub async fn offer(&self, record: Option<Arc<LogRecord>>) -> Result<()> {
        let Some(record) = record else {
            return Ok(());
        };

        self.sender
            .send(record)
            .map_err(|_| LoggerError::other("batching buffer is disconnected"))?;
        self.metrics.record_accepted();

        if self.should_flush() {
            self.flush().await?;
        }
        Ok(())
    }

    async fn deliver_with_retries(&self, batch: Vec<Arc<LogRecord>>) -> Result<()> {
        let mut attempt: u32 = 1;

        loop {
            match self.sink.deliver_batch(&batch).await {
                Ok(()) => {
                    self.metrics.record_delivered(batch.len());
                    return Ok(());
                }
                Err(error) if attempt <= self.settings.max_retries() => {
                    let delay = self.get_delay(attempt);
                    self.metrics.record_retry();
                    (self.diagnostics)(&Diagnostic::RetryScheduled {
                        target: self.name.clone(),
                        attempt,
                        delay,
                        error: error.to_string(),
                    });

                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(_) => return self.use_fallback(batch).await,
            }
        }
    }

    async fn use_fallback(&self, batch: Vec<Arc<LogRecord>>) -> Result<()> {
        let Some(fallback) = &self.fallback else {
            self.metrics.record_lost(batch.len());
            (self.diagnostics)(&Diagnostic::BatchLost {
                target: self.name.clone(),
                records: batch.len(),
                max_retries: self.settings.max_retries(),
            });
            return Ok(());
        };

        self.metrics.record_fallback();
        (self.diagnostics)(&Diagnostic::FallbackEngaged {
            target: self.name.clone(),
            fallback: fallback.name().to_string(),
            records: batch.len(),
            max_retries: self.settings.max_retries(),
        });

        match fallback.as_batch_target() {
            Some(batching) => batching.accept_batch(batch).await,
            None => {
                let total = batch.len();
                for (delivered, record) in batch.into_iter().enumerate() {
                    if let Err(error) = fallback.log(record).await {
                        // the failed record and everything after it
                        self.metrics.record_lost(total - delivered);
                        return Err(error);
                    }
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<S: BatchSink + 'static> Target for BatchingTarget<S> {
    async fn log(&self, record: Arc<LogRecord>) -> Result<()> {
        self.offer(Some(record)).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_batch_target(&self) -> Option<&dyn BatchTarget> {
        Some(self)
    }
}

#[async_trait]
impl<S: BatchSink + 'static> BatchTarget for BatchingTarget<S> {
    fn should_flush(&self) -> bool {
        self.buffered() >= self.settings.threshold()
    }

    async fn flush(&self) -> Result<()> {
        let _gate = self.flush_gate.lock().await;

        let batch: Vec<Arc<LogRecord>> = self.receiver.try_iter().collect();
        if batch.is_empty() {
            return Ok(());
        }
        self.deliver_with_retries(batch).await
    }

    async fn accept_batch(&self, records: Vec<Arc<LogRecord>>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let _gate = self.flush_gate.lock().await;
        self.deliver_with_retries(records).await
    }
}

impl<S: BatchSink> Drop for BatchingTarget<S> {
    fn drop(&mut self) {
        // Drop cannot await a flush; report what is left behind instead.
        let remaining = self.receiver.len();
        if remaining > 0 {
            (self.diagnostics)(&Diagnostic::DroppedUnflushed {
                target: self.name.clone(),
                records: remaining,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, LogRecord};
    use crate::targets::{MemorySink, MemoryTarget};
    use parking_lot::Mutex as SyncMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSink {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BatchSink for FailingSink {
        async fn deliver_batch(&self, _records: &[Arc<LogRecord>]) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(LoggerError::delivery("failing", "Crash Test!"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Fails the first `failures` deliveries, then records batches
    struct FlakySink {
        failures: AtomicUsize,
        inner: MemorySink,
    }

    #[async_trait]
    impl BatchSink for FlakySink {
        async fn deliver_batch(&self, records: &[Arc<LogRecord>]) -> Result<()> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(LoggerError::delivery("flaky", "temporarily unavailable"));
            }
            self.inner.deliver_batch(records).await
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn record(message: &str) -> Arc<LogRecord> {
        Arc::new(LogRecord::new("test", LogLevel::Information, message))
    }

    fn collecting() -> (DiagnosticCallback, Arc<SyncMutex<Vec<Diagnostic>>>) {
        let seen = Arc::new(SyncMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: DiagnosticCallback = Arc::new(move |d: &Diagnostic| sink.lock().push(d.clone()));
        (callback, seen)
    }

    fn fast_failing_config(max_size: i64) -> BatchConfig {
        BatchConfig::new()
            .max_size(max_size)
            .retry_delay(0.001)
            .progressive_delay(false)
    }

    #[test]
    fn test_rejects_invalid_threshold() {
        for invalid in [0, 1, -1, -100] {
            let result = BatchingTarget::new(MemorySink::new(), BatchConfig::new().max_size(invalid));
            assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
        }
    }

    #[test]
    fn test_rejects_negative_delay() {
        for invalid in [-1.0, -100.0] {
            let result =
                BatchingTarget::new(MemorySink::new(), BatchConfig::new().retry_delay(invalid));
            let err = result.err().unwrap();
            assert!(err.to_string().contains("use max_retries parameter"));
        }
    }

    #[test]
    fn test_get_delay() {
        let cases = [(1.0, 1, 1), (2.0, 1, 2), (1.0, 2, 2), (1.0, 3, 3), (5.0, 3, 15), (10.0, 3, 30)];
        for (base, attempt, expected) in cases {
            let target =
                BatchingTarget::new(MemorySink::new(), BatchConfig::new().retry_delay(base)).unwrap();
            assert_eq!(target.get_delay(attempt), Duration::from_secs(expected));
        }

        let constant = BatchingTarget::new(
            MemorySink::new(),
            BatchConfig::new().retry_delay(10.0).progressive_delay(false),
        )
        .unwrap();
        assert_eq!(constant.get_delay(3), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_flushes_exactly_at_threshold() {
        for max_size in [2usize, 10, 20, 30] {
            let sink = MemorySink::new();
            let target =
                BatchingTarget::new(sink.clone(), BatchConfig::new().max_size(max_size as i64)).unwrap();

            for i in 0..max_size - 1 {
                target.log(record(&format!("Message: {}", i))).await.unwrap();
            }
            assert!(sink.is_empty());
            assert_eq!(target.buffered(), max_size - 1);

            target.log(record(&format!("Message: {}", max_size - 1))).await.unwrap();

            let expected: Vec<String> = (0..max_size).map(|i| format!("Message: {}", i)).collect();
            assert_eq!(sink.messages(), expected);
            assert_eq!(sink.batch_sizes(), vec![max_size]);
            assert_eq!(target.buffered(), 0);
        }
    }

    #[tokio::test]
    async fn test_ignores_absent_record() {
        let sink = MemorySink::new();
        let target = BatchingTarget::new(sink.clone(), BatchConfig::new().max_size(5)).unwrap();

        for _ in 0..10 {
            target.offer(None).await.unwrap();
        }

        assert!(!target.should_flush());
        assert_eq!(target.buffered(), 0);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_flush_of_empty_buffer_is_noop() {
        let sink = MemorySink::new();
        let target = BatchingTarget::new(sink.clone(), BatchConfig::new()).unwrap();

        target.flush().await.unwrap();
        assert!(sink.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_retries_then_succeeds_without_fallback() {
        let sink = MemorySink::new();
        let flaky = FlakySink {
            failures: AtomicUsize::new(2),
            inner: sink.clone(),
        };
        let (callback, seen) = collecting();
        let target = BatchingTarget::new(flaky, fast_failing_config(2))
            .unwrap()
            .with_diagnostics(callback);

        target.log(record("a")).await.unwrap();
        target.log(record("b")).await.unwrap();

        assert_eq!(sink.messages(), vec!["a", "b"]);
        assert_eq!(target.metrics().retries(), 2);
        assert_eq!(target.metrics().records_delivered(), 2);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], Diagnostic::RetryScheduled { attempt: 1, .. }));
        assert!(matches!(seen[1], Diagnostic::RetryScheduled { attempt: 2, .. }));
    }

    #[tokio::test]
    async fn test_exhausted_retries_go_to_plain_fallback_in_order() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let fallback = MemoryTarget::new();
        let (callback, seen) = collecting();
        let target = BatchingTarget::new(
            FailingSink {
                attempts: Arc::clone(&attempts),
            },
            fast_failing_config(3),
        )
        .unwrap()
        .with_fallback(Arc::new(fallback.clone()))
        .with_diagnostics(callback);

        for message in ["one", "two", "three"] {
            target.log(record(message)).await.unwrap();
        }

        // one initial attempt plus three retries
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(fallback.messages(), vec!["one", "two", "three"]);
        assert_eq!(target.metrics().fallback_batches(), 1);

        let seen = seen.lock();
        assert_eq!(seen.len(), 4);
        assert!(matches!(seen[3], Diagnostic::FallbackEngaged { records: 3, .. }));
    }

    #[tokio::test]
    async fn test_exhausted_retries_without_fallback_lose_batch_quietly() {
        let (callback, seen) = collecting();
        let target = BatchingTarget::new(
            FailingSink {
                attempts: Arc::new(AtomicUsize::new(0)),
            },
            fast_failing_config(2),
        )
        .unwrap()
        .with_diagnostics(callback);

        target.log(record("a")).await.unwrap();
        target.log(record("b")).await.unwrap();

        assert_eq!(target.metrics().records_lost(), 2);
        let seen = seen.lock();
        assert!(matches!(
            seen.last(),
            Some(Diagnostic::BatchLost { records: 2, max_retries: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_retries_goes_straight_to_fallback() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let fallback = MemoryTarget::new();
        let target = BatchingTarget::new(
            FailingSink {
                attempts: Arc::clone(&attempts),
            },
            fast_failing_config(2).max_retries(0),
        )
        .unwrap()
        .with_fallback(Arc::new(fallback.clone()))
        .with_diagnostics(crate::core::diagnostics::silent_diagnostics());

        target.log(record("a")).await.unwrap();
        target.log(record("b")).await.unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.len(), 2);
    }

    #[tokio::test]
    async fn test_batching_fallback_receives_whole_batch() {
        let fallback_sink = MemorySink::new();
        let fallback = BatchingTarget::new(fallback_sink.clone(), BatchConfig::new().max_size(100))
            .unwrap();
        let target = BatchingTarget::new(
            FailingSink {
                attempts: Arc::new(AtomicUsize::new(0)),
            },
            fast_failing_config(5),
        )
        .unwrap()
        .with_fallback(Arc::new(fallback))
        .with_diagnostics(crate::core::diagnostics::silent_diagnostics());

        for i in 0..5 {
            target.log(record(&format!("Message: {}", i))).await.unwrap();
        }

        // delivered as one batch, not buffered below the fallback's threshold
        assert_eq!(fallback_sink.batch_sizes(), vec![5]);
        assert_eq!(fallback_sink.messages()[4], "Message: 4");
    }

    #[tokio::test]
    async fn test_failing_plain_fallback_error_reaches_flush_caller() {
        struct Broken;

        #[async_trait]
        impl Target for Broken {
            async fn log(&self, _record: Arc<LogRecord>) -> Result<()> {
                Err(LoggerError::delivery("broken", "Crash Test!"))
            }

            fn name(&self) -> &str {
                "broken"
            }
        }

        let target = BatchingTarget::new(
            FailingSink {
                attempts: Arc::new(AtomicUsize::new(0)),
            },
            fast_failing_config(5),
        )
        .unwrap()
        .with_fallback(Arc::new(Broken))
        .with_diagnostics(crate::core::diagnostics::silent_diagnostics());

        target.log(record("a")).await.unwrap();
        let err = target.flush().await.unwrap_err();
        assert!(err.to_string().contains("Crash Test!"));
        assert_eq!(target.metrics().records_lost(), 1);
    }

    #[tokio::test]
    async fn test_plain_fallback_failure_counts_undelivered_records() {
        /// Accepts `capacity` records, then fails every call
        struct Limited {
            capacity: usize,
            inner: MemoryTarget,
        }

        #[async_trait]
        impl Target for Limited {
            async fn log(&self, record: Arc<LogRecord>) -> Result<()> {
                if self.inner.len() >= self.capacity {
                    return Err(LoggerError::delivery("limited", "full"));
                }
                self.inner.log(record).await
            }

            fn name(&self) -> &str {
                "limited"
            }
        }

        let kept = MemoryTarget::new();
        let target = BatchingTarget::new(
            FailingSink {
                attempts: Arc::new(AtomicUsize::new(0)),
            },
            fast_failing_config(5).max_retries(0),
        )
        .unwrap()
        .with_fallback(Arc::new(Limited {
            capacity: 2,
            inner: kept.clone(),
        }))
        .with_diagnostics(crate::core::diagnostics::silent_diagnostics());

        for i in 0..4 {
            target.log(record(&format!("Message: {}", i))).await.unwrap();
        }
        assert!(target.flush().await.is_err());

        assert_eq!(kept.messages(), vec!["Message: 0", "Message: 1"]);
        assert_eq!(target.metrics().records_accepted(), 4);
        assert_eq!(target.metrics().records_lost(), 2);
        assert!((target.metrics().loss_rate() - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_drop_reports_unflushed_records() {
        let (callback, seen) = collecting();
        let target = BatchingTarget::new(MemorySink::new(), BatchConfig::new().max_size(10))
            .unwrap()
            .with_diagnostics(callback);

        target.log(record("pending")).await.unwrap();
        drop(target);

        assert!(matches!(
            seen.lock().as_slice(),
            [Diagnostic::DroppedUnflushed { records: 1, .. }]
        ));
    }
}
