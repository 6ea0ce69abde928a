//! Pipeline metrics for observability
//!
//! Counters describing what a batching target did with the records it
//! accepted: how many were delivered, how often delivery was retried, and
//! how many records went to the fallback or were lost.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for one batching pipeline
///
/// # Example
///
/// ```
/// use rust_log_facade::PipelineMetrics;
///
/// let metrics = PipelineMetrics::new();
///
/// metrics.record_accepted();
/// metrics.record_delivered(1);
///
/// assert_eq!(metrics.records_accepted(), 1);
/// assert_eq!(metrics.records_delivered(), 1);
/// ```
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Records appended to the buffer
    records_accepted: AtomicU64,

    /// Batches the sink accepted
    batches_delivered: AtomicU64,

    /// Records inside delivered batches
    records_delivered: AtomicU64,

    /// Failed attempts that were followed by a retry
    retries: AtomicU64,

    /// Batches handed to the fallback target
    fallback_batches: AtomicU64,

    /// Records discarded after retries ran out with no fallback
    records_lost: AtomicU64,
}

impl PipelineMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            records_accepted: AtomicU64::new(0),
            batches_delivered: AtomicU64::new(0),
            records_delivered: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            fallback_batches: AtomicU64::new(0),
            records_lost: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_accepted(&self) -> u64 {
        self.records_accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_delivered(&self) -> u64 {
        self.batches_delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_delivered(&self) -> u64 {
        self.records_delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn fallback_batches(&self) -> u64 {
        self.fallback_batches.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_lost(&self) -> u64 {
        self.records_lost.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_accepted(&self) -> u64 {
        self.records_accepted.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a successful batch of `records` records
    #[inline]
    pub fn record_delivered(&self, records: usize) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
        self.records_delivered
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) -> u64 {
        self.retries.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_fallback(&self) -> u64 {
        self.fallback_batches.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_lost(&self, records: usize) -> u64 {
        self.records_lost.fetch_add(records as u64, Ordering::Relaxed)
    }

    /// Lost records as a percentage (0.0 - 100.0) of accepted records
    ///
    /// Returns 0.0 if nothing has been accepted.
    pub fn loss_rate(&self) -> f64 {
        let accepted = self.records_accepted() as f64;
        if accepted == 0.0 {
            0.0
        } else {
            (self.records_lost() as f64 / accepted) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.records_accepted.store(0, Ordering::Relaxed);
        self.batches_delivered.store(0, Ordering::Relaxed);
        self.records_delivered.store(0, Ordering::Relaxed);
        self.retries.store(0, Ordering::Relaxed);
        self.fallback_batches.store(0, Ordering::Relaxed);
        self.records_lost.store(0, Ordering::Relaxed);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PipelineMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            records_accepted: AtomicU64::new(self.records_accepted()),
            batches_delivered: AtomicU64::new(self.batches_delivered()),
            records_delivered: AtomicU64::new(self.records_delivered()),
            retries: AtomicU64::new(self.retries()),
            fallback_batches: AtomicU64::new(self.fallback_batches()),
            records_lost: AtomicU64::new(self.records_lost()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.records_accepted(), 0);
        assert_eq!(metrics.batches_delivered(), 0);
        assert_eq!(metrics.retries(), 0);
        assert_eq!(metrics.records_lost(), 0);
    }

    #[test]
    fn test_record_delivered_counts_batch_and_records() {
        let metrics = PipelineMetrics::new();
        metrics.record_delivered(5);
        metrics.record_delivered(3);
        assert_eq!(metrics.batches_delivered(), 2);
        assert_eq!(metrics.records_delivered(), 8);
    }

    #[test]
    fn test_loss_rate() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.loss_rate(), 0.0);

        for _ in 0..10 {
            metrics.record_accepted();
        }
        metrics.record_lost(1);

        let rate = metrics.loss_rate();
        assert!((9.9..=10.1).contains(&rate), "Loss rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset_and_clone() {
        let metrics = PipelineMetrics::new();
        metrics.record_retry();
        metrics.record_fallback();

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.retries(), 0);
        assert_eq!(snapshot.retries(), 1);
        assert_eq!(snapshot.fallback_batches(), 1);
    }
}
