//! Target traits: where log records go
//!
//! - [`Target`] accepts one record at a time; every destination implements it.
//! - [`BatchTarget`] is the optional capability of targets that buffer
//!   records and deliver them in groups. Loggers and factories discover it
//!   through [`Target::as_batch_target`].
//! - [`BatchSink`] is the destination-specific half of a batching target:
//!   it writes one whole batch or fails.

use super::error::Result;
use super::record::LogRecord;
use async_trait::async_trait;
use std::sync::Arc;

/// A destination for log records
///
/// # Example
///
/// ```
/// use rust_log_facade::core::{LogRecord, Result, Target};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct StdoutTarget;
///
/// #[async_trait]
/// impl Target for StdoutTarget {
///     async fn log(&self, record: Arc<LogRecord>) -> Result<()> {
///         println!("{} {}", record.level, record.rendered_message());
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "stdout"
///     }
/// }
/// ```
#[async_trait]
pub trait Target: Send + Sync {
    /// Accept one record for delivery
    async fn log(&self, record: Arc<LogRecord>) -> Result<()>;

    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// The batching capability of this target, if it has one
    fn as_batch_target(&self) -> Option<&dyn BatchTarget> {
        None
    }
}

/// Capability of targets that deliver records in groups
#[async_trait]
pub trait BatchTarget: Target {
    /// Whether the buffer has reached the flush threshold
    fn should_flush(&self) -> bool;

    /// Drain the buffer and deliver everything in it as one batch
    async fn flush(&self) -> Result<()>;

    /// Deliver an already-formed batch in one call, bypassing the buffer
    async fn accept_batch(&self, records: Vec<Arc<LogRecord>>) -> Result<()>;
}

/// Destination-specific batch delivery
///
/// Implementations must return an error instead of silently dropping any
/// record of the batch.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn deliver_batch(&self, records: &[Arc<LogRecord>]) -> Result<()>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<S: BatchSink + ?Sized> BatchSink for Arc<S> {
    async fn deliver_batch(&self, records: &[Arc<LogRecord>]) -> Result<()> {
        (**self).deliver_batch(records).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
