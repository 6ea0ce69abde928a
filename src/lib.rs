//! # Rust Log Facade
//!
//! An asynchronous logging facade: named loggers obtained from a factory
//! emit leveled records, and the factory routes each record to the targets
//! registered for its level.
//!
//! ## Features
//!
//! - **Level Routing**: Targets register a minimum level and receive every record at or above it
//! - **Batching Targets**: Records are buffered and delivered in groups
//! - **Retry and Fallback**: Failed batches are retried with constant or progressive backoff, then redirected to a fallback target
//! - **Graceful Shutdown**: Disposing a factory flushes every batching target
//! - **`log` Bridge**: `LogCrateTarget` forwards records to any `log` backend (`log-bridge` feature)

pub mod core;
pub mod targets;

pub mod prelude {
    pub use crate::core::{
        BatchConfig, BatchSink, BatchTarget, BatchingTarget, Diagnostic, DiagnosticCallback,
        ErrorInfo, FactoryConfig, FieldValue, Fields, LogLevel, LogRecord, Logger, LoggerError,
        LoggerFactory, LoggerFactoryBuilder, PipelineMetrics, RecordFormat, Result, Target,
        TimestampFormat,
    };
}

pub use crate::core::{
    BatchConfig, BatchSettings, BatchSink, BatchTarget, BatchingTarget, Diagnostic,
    DiagnosticCallback, DisposeErrorCallback, ErrorInfo, FactoryConfig, FieldValue, Fields,
    LogLevel, LogRecord, Logger, LoggerError, LoggerFactory, LoggerFactoryBuilder,
    PipelineMetrics, RecordFormat, RecordKind, Result, Target, TimestampFormat,
};
