//! Console target implementation

use crate::core::{LogLevel, LogRecord, RecordFormat, Result, Target, TimestampFormat};
use async_trait::async_trait;
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;

pub struct ConsoleTarget {
    use_colors: bool,
    timestamp_format: TimestampFormat,
    format: RecordFormat,
}

impl ConsoleTarget {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            timestamp_format: TimestampFormat::default(),
            format: RecordFormat::default(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set the line format for this target
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_facade::targets::ConsoleTarget;
    /// use rust_log_facade::RecordFormat;
    ///
    /// let target = ConsoleTarget::new().with_format(RecordFormat::Json);
    /// ```
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

    fn line(&self, record: &LogRecord) -> Result<String> {
        let line = self.format.render(record, &self.timestamp_format)?;
        if self.use_colors && self.format == RecordFormat::Text {
            let level = record.level.to_str();
            let colored = level.color(record.level.color_code()).to_string();
            return Ok(line.replacen(level, &colored, 1));
        }
        Ok(line)
    }
}

impl Default for ConsoleTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Target for ConsoleTarget {
    async fn log(&self, record: Arc<LogRecord>) -> Result<()> {
        let line = self.line(&record)?;

        // Route Error and Critical levels to stderr, others to stdout
        match record.level {
            LogLevel::Error | LogLevel::Critical => writeln!(std::io::stderr(), "{}", line)?,
            _ => writeln!(std::io::stdout(), "{}", line)?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
