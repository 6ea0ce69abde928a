//! TCP sink for remote logging
//!
//! Sends each batch to a remote server as newline-delimited JSON.
//! Useful for centralized logging in distributed systems.

use crate::core::{BatchSink, LogRecord, LoggerError, RecordFormat, Result, TimestampFormat};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Batch sink that writes to a TCP server
///
/// The connection is opened on the first delivery. When a write fails the
/// connection is dropped and the error returned, so the next retry of the
/// owning [`BatchingTarget`](crate::core::BatchingTarget) reconnects.
///
/// # Example
///
/// ```no_run
/// use rust_log_facade::prelude::*;
/// use rust_log_facade::targets::TcpSink;
///
/// # fn main() -> Result<()> {
/// let sink = TcpSink::new("127.0.0.1:5170");
/// let target = BatchingTarget::new(sink, BatchConfig::new().max_size(50))?;
/// # Ok(())
/// # }
/// ```
pub struct TcpSink {
    stream: Mutex<Option<TcpStream>>,
    address: String,
    timeout: Duration,
    format: RecordFormat,
    timestamp_format: TimestampFormat,
}

impl TcpSink {
    /// Create a sink for `address` (e.g. "localhost:5170")
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            stream: Mutex::new(None),
            address: address.into(),
            timeout: DEFAULT_TIMEOUT,
            format: RecordFormat::Json,
            timestamp_format: TimestampFormat::default(),
        }
    }

    /// Timeout applied to connecting and to writing one batch
    ///
    /// Default: 5 seconds
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
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

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connect(&self) -> Result<TcpStream> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| LoggerError::delivery("tcp", format!("connecting to {} timed out", self.address)))?
            .map_err(|e| LoggerError::io_operation("connecting", self.address.clone(), e))?;

        // Enable TCP_NODELAY for low-latency logging
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    async fn write_chunk(&self, stream: &mut TcpStream, chunk: &[u8]) -> Result<()> {
        let write = async {
            stream.write_all(chunk).await?;
            stream.flush().await
        };

        match tokio::time::timeout(self.timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LoggerError::io_operation("sending batch", self.address.clone(), e)),
            Err(_) => Err(LoggerError::delivery(
                "tcp",
                format!("sending to {} timed out", self.address),
            )),
        }
    }
}

#[async_trait]
impl BatchSink for TcpSink {
    async fn deliver_batch(&self, records: &[Arc<LogRecord>]) -> Result<()> {
        let mut chunk = String::new();
        for record in records {
            chunk.push_str(&self.format.render(record, &self.timestamp_format)?);
            chunk.push('\n');
        }

        let mut guard = self.stream.lock().await;
        let mut stream = match guard.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };

        // A failed stream is not put back; the next delivery reconnects
        self.write_chunk(&mut stream, chunk.as_bytes()).await?;
        *guard = Some(stream);
        Ok(())
    }

    fn name(&self) -> &str {
        "tcp"
    }
}
