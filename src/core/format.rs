//! Rendering of log records into lines of text
//!
//! - Text: `[2025-01-08T10:30:45.123Z] [INFORMATION] app - Request processed id=7`
//! - Json: one object per line, suitable for log aggregation tools

use super::error::Result;
use super::record::LogRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,
    /// `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,
    /// `1736332245123`
    UnixMillis,
    /// strftime-compatible pattern
    Custom(String),
}

impl TimestampFormat {
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(pattern) => datetime.format(pattern).to_string(),
        }
    }
}

/// Line format for text-oriented targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordFormat {
    #[default]
    Text,
    Json,
}

impl RecordFormat {
    /// Render one record as a single line without a trailing newline
    pub fn render(&self, record: &LogRecord, timestamps: &TimestampFormat) -> Result<String> {
        match self {
            RecordFormat::Text => Ok(Self::render_text(record, timestamps)),
            RecordFormat::Json => Self::render_json(record, timestamps),
        }
    }

    fn render_text(record: &LogRecord, timestamps: &TimestampFormat) -> String {
        let mut line = format!(
            "[{}] [{:11}] {} - {}",
            timestamps.format(&record.time),
            record.level.to_str(),
            record.logger_name,
            record.rendered_message()
        );

        if !record.data.is_empty() {
            line.push(' ');
            line.push_str(&record.data.format_fields());
        }

        if record.is_exception() {
            match record.exception() {
                Some(error) => line.push_str(&format!(" | exception: {}", error)),
                None => line.push_str(" | exception: <not supplied>"),
            }
        }

        line
    }

    fn render_json(record: &LogRecord, timestamps: &TimestampFormat) -> Result<String> {
        let mut object = serde_json::Map::new();

        let time = match timestamps {
            TimestampFormat::UnixMillis => serde_json::Value::from(record.time.timestamp_millis()),
            other => serde_json::Value::String(other.format(&record.time)),
        };
        object.insert("time".to_string(), time);
        object.insert("level".to_string(), serde_json::to_value(record.level)?);
        object.insert(
            "logger".to_string(),
            serde_json::Value::String(record.logger_name.clone()),
        );
        object.insert(
            "message".to_string(),
            serde_json::Value::String(record.rendered_message()),
        );

        if !record.args.is_empty() {
            object.insert("args".to_string(), serde_json::to_value(&record.args)?);
        }
        if !record.data.is_empty() {
            object.insert("fields".to_string(), serde_json::to_value(&record.data)?);
        }
        if record.is_exception() {
            object.insert(
                "exception".to_string(),
                serde_json::to_value(record.exception())?,
            );
        }

        Ok(serde_json::to_string(&serde_json::Value::Object(object))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorInfo, Fields, LogLevel};

    fn sample() -> LogRecord {
        LogRecord::new("api", LogLevel::Warning, "user {} logged in")
            .with_args(vec!["alice".into()])
            .with_data(Fields::new().with_field("ip", "10.0.0.1"))
    }

    #[test]
    fn test_text_format() {
        let line = RecordFormat::Text
            .render(&sample(), &TimestampFormat::Iso8601)
            .unwrap();

        assert!(line.contains("[WARNING    ]"));
        assert!(line.contains("api - user alice logged in ip=10.0.0.1"));
        assert!(line.starts_with('['));
    }

    #[test]
    fn test_text_format_exception() {
        let record = sample().with_exception(Some(ErrorInfo::new("timeout")));
        let line = RecordFormat::Text
            .render(&record, &TimestampFormat::Iso8601)
            .unwrap();
        assert!(line.ends_with("| exception: timeout"));
    }

    #[test]
    fn test_json_format() {
        let line = RecordFormat::Json
            .render(&sample(), &TimestampFormat::UnixMillis)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed["level"], "WARNING");
        assert_eq!(parsed["logger"], "api");
        assert_eq!(parsed["message"], "user alice logged in");
        assert_eq!(parsed["fields"]["ip"], "10.0.0.1");
        assert!(parsed["time"].is_i64());
        assert!(parsed.get("exception").is_none());
    }

    #[test]
    fn test_custom_timestamp() {
        let record = sample();
        let rendered = TimestampFormat::Custom("%Y".to_string()).format(&record.time);
        assert_eq!(rendered.len(), 4);
    }
}
