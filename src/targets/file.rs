//! File sink for batching targets
//!
//! Appends each delivered batch to a file with one write, then flushes it.
//! The file is held under an exclusive advisory lock for the lifetime of
//! the sink so two processes never interleave batches in the same file.

use crate::core::{BatchSink, LogRecord, LoggerError, RecordFormat, Result, TimestampFormat};
use async_trait::async_trait;
use fs2::FileExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Batch sink appending records to a file
///
/// # Example
///
/// ```no_run
/// use rust_log_facade::prelude::*;
/// use rust_log_facade::targets::FileSink;
///
/// # fn main() -> Result<()> {
/// let sink = FileSink::new("/var/log/app.log")?.with_format(RecordFormat::Json);
/// let target = BatchingTarget::new(sink, BatchConfig::new().max_size(100))?;
/// # Ok(())
/// # }
/// ```
pub struct FileSink {
    file: Mutex<File>,
    path: PathBuf,
    format: RecordFormat,
    timestamp_format: TimestampFormat,
}

impl FileSink {
    /// Open (or create) `path` for appending and lock it
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or another process holds
    /// its lock.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::io_operation("opening log file", path.display().to_string(), e))?;

        file.try_lock_exclusive().map_err(|e| {
            LoggerError::io_operation("locking log file", path.display().to_string(), e)
        })?;

        Ok(Self {
            file: Mutex::new(File::from_std(file)),
            path,
            format: RecordFormat::Text,
            timestamp_format: TimestampFormat::default(),
        })
    }

    #[must_use]
    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BatchSink for FileSink {
    async fn deliver_batch(&self, records: &[Arc<LogRecord>]) -> Result<()> {
        let mut chunk = String::new();
        for record in records {
            chunk.push_str(&self.format.render(record, &self.timestamp_format)?);
            chunk.push('\n');
        }

        let mut file = self.file.lock().await;
        file.write_all(chunk.as_bytes())
            .await
            .map_err(|e| LoggerError::io_operation("writing batch", self.path.display().to_string(), e))?;
        file.flush()
            .await
            .map_err(|e| LoggerError::io_operation("flushing batch", self.path.display().to_string(), e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}
