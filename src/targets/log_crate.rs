//! Bridge to the `log` crate
//!
//! [`LogCrateTarget`] hands every record to a synchronous [`log::Log`]
//! implementation, by default the global logger installed with
//! `log::set_logger`. The record's logger name becomes the `log` target,
//! so each named logger shows up as its own target in the backend.
//! Fields and the attached error travel as key-value pairs.

use crate::core::{LogLevel, LogRecord, Result, Target, EXCEPTION_FIELD};
use async_trait::async_trait;
use log::kv::{ToKey, ToValue};
use std::sync::Arc;

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::None => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Information => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error | LogLevel::Critical => log::Level::Error,
        }
    }
}

/// Target forwarding records to a `log` backend
///
/// # Example
///
/// ```
/// use rust_log_facade::prelude::*;
/// use rust_log_facade::targets::LogCrateTarget;
/// use std::sync::Arc;
///
/// let factory = LoggerFactory::builder()
///     .target(Arc::new(LogCrateTarget::new()), LogLevel::Information)
///     .build();
/// ```
pub struct LogCrateTarget {
    logger: Option<&'static dyn log::Log>,
    target: Option<String>,
}

impl LogCrateTarget {
    /// Forward to the global `log` logger, one `log` target per logger name
    pub fn new() -> Self {
        Self {
            logger: None,
            target: None,
        }
    }

    /// Use `target` for every record instead of the record's logger name
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Forward to `logger` instead of the global logger
    #[must_use]
    pub fn with_logger(mut self, logger: &'static dyn log::Log) -> Self {
        self.logger = Some(logger);
        self
    }

    fn backend(&self) -> &'static dyn log::Log {
        self.logger.unwrap_or_else(log::logger)
    }
}

impl Default for LogCrateTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Target for LogCrateTarget {
    async fn log(&self, record: Arc<LogRecord>) -> Result<()> {
        let backend = self.backend();
        let level = log::Level::from(record.level);
        let target = self.target.as_deref().unwrap_or(&record.logger_name);

        let metadata = log::Metadata::builder().level(level).target(target).build();
        if !backend.enabled(&metadata) {
            return Ok(());
        }

        let message = record.rendered_message();
        let kvs = RecordKvs::new(&record);
        backend.log(
            &log::Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{}", message))
                .key_values(&kvs)
                .build(),
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Record fields plus the attached error as `log` key-value pairs
struct RecordKvs {
    pairs: Vec<(String, String)>,
}

impl RecordKvs {
    fn new(record: &LogRecord) -> Self {
        let mut pairs: Vec<(String, String)> = record
            .data
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();

        if let Some(error) = record.exception() {
            pairs.push((EXCEPTION_FIELD.to_string(), error.to_string()));
        }
        Self { pairs }
    }
}

impl log::kv::Source for RecordKvs {
    fn visit<'kvs>(
        &'kvs self,
        visitor: &mut dyn log::kv::VisitSource<'kvs>,
    ) -> std::result::Result<(), log::kv::Error> {
        for (key, value) in &self.pairs {
            visitor.visit_pair(key.as_str().to_key(), value.as_str().to_value())?;
        }
        Ok(())
    }
}
