//! Core facade types and traits

pub mod batching;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod factory;
pub mod fields;
pub mod format;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod target;

pub use batching::BatchingTarget;
pub use config::{BatchConfig, BatchSettings, FactoryConfig};
pub use diagnostics::{silent_diagnostics, stderr_diagnostics, Diagnostic, DiagnosticCallback};
pub use error::{LoggerError, Result};
pub use factory::{DisposeErrorCallback, LoggerFactory, LoggerFactoryBuilder};
pub use fields::{ErrorInfo, FieldValue, Fields};
pub use format::{RecordFormat, TimestampFormat};
pub use log_level::LogLevel;
pub use logger::Logger;
pub use metrics::PipelineMetrics;
pub use record::{create_record, LogRecord, RecordKind, EXCEPTION_FIELD};
pub use registry::{SharedRegistry, TargetRegistry};
pub use target::{BatchSink, BatchTarget, Target};
