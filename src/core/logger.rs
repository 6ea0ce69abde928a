//! Named logger: level gate and target cascade

use super::diagnostics::{Diagnostic, DiagnosticCallback};
use super::error::Result;
use super::fields::{ErrorInfo, FieldValue, Fields};
use super::log_level::LogLevel;
use super::record::{create_record, LogRecord, EXCEPTION_FIELD};
use super::registry::SharedRegistry;
use std::error::Error as StdError;
use std::sync::Arc;

/// A named source of log records
///
/// Loggers are obtained from a [`LoggerFactory`](super::factory::LoggerFactory)
/// and share its target registry, so targets added after a logger was
/// created still receive its records. Level bounds are fixed when the
/// logger is created.
///
/// A record at level `L` is delivered by walking the registry buckets from
/// `L` downward to the logger's minimum level. A target registered with
/// minimum level `M` sits in bucket `M` only, so it sees every record whose
/// level is at least `M`, exactly once.
pub struct Logger {
    name: String,
    min_level: LogLevel,
    max_level: LogLevel,
    targets: SharedRegistry,
    diagnostics: DiagnosticCallback,
}

impl Logger {
    pub(crate) fn new(
        name: impl Into<String>,
        targets: SharedRegistry,
        min_level: LogLevel,
        max_level: LogLevel,
        diagnostics: DiagnosticCallback,
    ) -> Self {
        Self {
            name: name.into(),
            min_level,
            max_level,
            targets,
            diagnostics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn max_level(&self) -> LogLevel {
        self.max_level
    }

    /// Build a record attributed to this logger
    pub fn create_record(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        args: Vec<FieldValue>,
        fields: Fields,
    ) -> LogRecord {
        create_record(&self.name, level, message, args, fields)
    }

    /// Log a message at `level`
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidLevel`](super::error::LoggerError::InvalidLevel)
    /// when `level` is not a [`LogLevel`] value. Target failures are never
    /// returned; they go to the diagnostic channel.
    pub async fn log(&self, level: impl Into<i32>, message: impl Into<String>) -> Result<()> {
        self.log_with(level, message, Vec::new(), Fields::new()).await
    }

    /// Log a message with positional arguments and named fields
    ///
    /// A field named `exception` turns the record into an exception record;
    /// see [`create_record`].
    pub async fn log_with(
        &self,
        level: impl Into<i32>,
        message: impl Into<String>,
        args: Vec<FieldValue>,
        fields: Fields,
    ) -> Result<()> {
        let level = LogLevel::try_from(level.into())?;
        self.dispatch(level, message.into(), args, fields).await;
        Ok(())
    }

    #[inline]
    pub async fn debug(&self, message: impl Into<String>) {
        self.dispatch(LogLevel::Debug, message.into(), Vec::new(), Fields::new())
            .await;
    }

    #[inline]
    pub async fn info(&self, message: impl Into<String>) {
        self.dispatch(LogLevel::Information, message.into(), Vec::new(), Fields::new())
            .await;
    }

    #[inline]
    pub async fn warning(&self, message: impl Into<String>) {
        self.dispatch(LogLevel::Warning, message.into(), Vec::new(), Fields::new())
            .await;
    }

    #[inline]
    pub async fn error(&self, message: impl Into<String>) {
        self.dispatch(LogLevel::Error, message.into(), Vec::new(), Fields::new())
            .await;
    }

    #[inline]
    pub async fn critical(&self, message: impl Into<String>) {
        self.dispatch(LogLevel::Critical, message.into(), Vec::new(), Fields::new())
            .await;
    }

    /// Log an exception record at `Error` level
    ///
    /// Without an error the record is still an exception record, with no
    /// error attached.
    pub async fn exception(
        &self,
        message: impl Into<String>,
        error: Option<&(dyn StdError + 'static)>,
    ) {
        let value = match error {
            Some(error) => FieldValue::Error(ErrorInfo::from_error(error)),
            None => FieldValue::Null,
        };
        let fields = Fields::new().with_field(EXCEPTION_FIELD, value);

        self.dispatch(LogLevel::Error, message.into(), Vec::new(), fields)
            .await;
    }

    async fn dispatch(&self, level: LogLevel, message: String, args: Vec<FieldValue>, fields: Fields) {
        if level > self.max_level {
            return;
        }

        let record = Arc::new(self.create_record(level, message, args, fields));

        let mut walking = Some(level);
        while let Some(current) = walking.filter(|l| *l >= self.min_level) {
            let bucket = self.targets.read().bucket(current);

            for target in bucket {
                if let Err(error) = target.log(Arc::clone(&record)).await {
                    (self.diagnostics)(&Diagnostic::TargetFailed {
                        target: target.name().to_string(),
                        error: error.to_string(),
                    });
                }
            }

            walking = current.lower();
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("min_level", &self.min_level)
            .field("max_level", &self.max_level)
            .finish()
    }
}
