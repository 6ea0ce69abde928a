//! Log record structure

use super::fields::{ErrorInfo, FieldValue, Fields};
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field name that turns a record into an exception record
pub const EXCEPTION_FIELD: &str = "exception";

/// Distinguishes plain records from exception-bearing ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordKind {
    Standard,
    /// The error is absent when the caller asked for an exception record
    /// without supplying one
    Exception { error: Option<ErrorInfo> },
}

/// One log event; built once and shared read-only by every target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    pub logger_name: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<FieldValue>,
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub data: Fields,
    #[serde(flatten)]
    pub kind: RecordKind,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(logger_name: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            logger_name: logger_name.into(),
            level,
            message: Self::sanitize_message(&message.into()),
            args: Vec::new(),
            data: Fields::new(),
            kind: RecordKind::Standard,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<FieldValue>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Fields) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn with_exception(mut self, error: Option<ErrorInfo>) -> Self {
        self.kind = RecordKind::Exception { error };
        self
    }

    pub fn is_exception(&self) -> bool {
        matches!(self.kind, RecordKind::Exception { .. })
    }

    /// The attached error, if this is an exception record carrying one
    pub fn exception(&self) -> Option<&ErrorInfo> {
        match &self.kind {
            RecordKind::Exception { error } => error.as_ref(),
            RecordKind::Standard => None,
        }
    }

    /// Substitute each `{}` in the message template with the next positional
    /// argument. Placeholders without a matching argument are kept verbatim.
    pub fn rendered_message(&self) -> String {
        let mut out = String::with_capacity(self.message.len());
        let mut args = self.args.iter();
        let mut rest = self.message.as_str();

        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => out.push_str(&arg.to_string()),
                None => out.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// Build a record, or an exception record when `fields` carries
/// [`EXCEPTION_FIELD`].
///
/// The exception entry is moved out of the field map. A
/// [`FieldValue::Error`] value becomes the attached error; any other value
/// yields an exception record without an error.
pub fn create_record(
    logger_name: &str,
    level: LogLevel,
    message: impl Into<String>,
    args: Vec<FieldValue>,
    mut fields: Fields,
) -> LogRecord {
    let exception = fields.remove(EXCEPTION_FIELD);
    let record = LogRecord::new(logger_name, level, message)
        .with_args(args)
        .with_data(fields);

    match exception {
        Some(FieldValue::Error(info)) => record.with_exception(Some(info)),
        Some(_) => record.with_exception(None),
        None => record,
    }
}
