//! In-memory targets
//!
//! Both types are cheap to clone; clones share the same storage, so one
//! handle can be given to a logger factory while another inspects what
//! arrived.

use crate::core::{BatchSink, LogRecord, Result, Target};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Plain target storing every record it receives
#[derive(Clone)]
pub struct MemoryTarget {
    name: String,
    records: Arc<Mutex<Vec<Arc<LogRecord>>>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of the stored records, in arrival order
    pub fn records(&self) -> Vec<Arc<LogRecord>> {
        self.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Target for MemoryTarget {
    async fn log(&self, record: Arc<LogRecord>) -> Result<()> {
        self.records.lock().push(record);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Batch sink storing every delivered batch
#[derive(Clone)]
pub struct MemorySink {
    name: String,
    records: Arc<Mutex<Vec<Arc<LogRecord>>>>,
    batch_sizes: Arc<Mutex<Vec<usize>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::named("memory_sink")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(Mutex::new(Vec::new())),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn records(&self) -> Vec<Arc<LogRecord>> {
        self.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Size of every delivered batch, in delivery order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchSink for MemorySink {
    async fn deliver_batch(&self, records: &[Arc<LogRecord>]) -> Result<()> {
        self.records.lock().extend(records.iter().cloned());
        self.batch_sizes.lock().push(records.len());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    #[tokio::test]
    async fn test_memory_target_shares_storage_between_clones() {
        let target = MemoryTarget::new();
        let handle = target.clone();

        target
            .log(Arc::new(LogRecord::new("app", LogLevel::Information, "hello")))
            .await
            .unwrap();

        assert_eq!(handle.messages(), vec!["hello"]);
        handle.clear();
        assert!(target.is_empty());
    }

    #[tokio::test]
    async fn test_memory_sink_tracks_batches() {
        let sink = MemorySink::new();
        let batch: Vec<_> = (0..3)
            .map(|i| Arc::new(LogRecord::new("app", LogLevel::Debug, format!("m{}", i))))
            .collect();

        sink.deliver_batch(&batch).await.unwrap();
        sink.deliver_batch(&batch[..1]).await.unwrap();

        assert_eq!(sink.batch_sizes(), vec![3, 1]);
        assert_eq!(sink.len(), 4);
    }
}
