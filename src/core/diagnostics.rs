//! Non-fatal diagnostic channel
//!
//! Delivery retries, fallback use and permanent record loss are reported
//! here instead of being returned to the logging caller. The default
//! channel writes one `[LOGGER WARNING]` line per event to stderr; hosts
//! can install their own callback to forward events to alerting.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// A non-fatal event raised by the delivery pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A batch delivery failed and will be attempted again after `delay`
    RetryScheduled {
        target: String,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    /// Retries are exhausted and the batch goes to the fallback target
    FallbackEngaged {
        target: String,
        fallback: String,
        records: usize,
        max_retries: u32,
    },
    /// Retries are exhausted and no fallback is configured
    BatchLost {
        target: String,
        records: usize,
        max_retries: u32,
    },
    /// A batching target was dropped with records still buffered
    DroppedUnflushed { target: String, records: usize },
    /// A target returned an error to the logger cascade
    TargetFailed { target: String, error: String },
    /// A target failed to flush while the factory was being disposed
    DisposeFailed { target: String, error: String },
}

impl Diagnostic {
    /// Name of the target the event concerns
    pub fn target(&self) -> &str {
        match self {
            Diagnostic::RetryScheduled { target, .. }
            | Diagnostic::FallbackEngaged { target, .. }
            | Diagnostic::BatchLost { target, .. }
            | Diagnostic::DroppedUnflushed { target, .. }
            | Diagnostic::TargetFailed { target, .. }
            | Diagnostic::DisposeFailed { target, .. } => target,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RetryScheduled {
                target,
                attempt,
                delay,
                error,
            } => write!(
                f,
                "Failed to log records for {}. Error: {}. Trying again in {:?}; failed attempt n. {}",
                target, error, delay, attempt
            ),
            Diagnostic::FallbackEngaged {
                target,
                fallback,
                records,
                max_retries,
            } => write!(
                f,
                "Failed to log records for {}. Logging failed for configured retries: {}; \
                 sending {} records to fallback target {}",
                target, max_retries, records, fallback
            ),
            Diagnostic::BatchLost {
                target,
                records,
                max_retries,
            } => write!(
                f,
                "Failed to log records for {}. Logging failed for configured retries: {}; \
                 a fallback target is not configured, hence {} log records are lost",
                target, max_retries, records
            ),
            Diagnostic::DroppedUnflushed { target, records } => write!(
                f,
                "Target {} was dropped without a final flush; {} buffered log records are lost",
                target, records
            ),
            Diagnostic::TargetFailed { target, error } => {
                write!(f, "Target {} failed to log a record: {}", target, error)
            }
            Diagnostic::DisposeFailed { target, error } => {
                write!(f, "Target {} failed to flush during dispose: {}", target, error)
            }
        }
    }
}

/// Callback receiving every diagnostic event
pub type DiagnosticCallback = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

/// The default channel: one warning line per event on stderr
pub fn stderr_diagnostics() -> DiagnosticCallback {
    Arc::new(|diagnostic: &Diagnostic| {
        let _ = writeln!(std::io::stderr(), "[LOGGER WARNING] {}", diagnostic);
    })
}

/// A channel that discards every event
pub fn silent_diagnostics() -> DiagnosticCallback {
    Arc::new(|_: &Diagnostic| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_message_names_target_and_delay() {
        let d = Diagnostic::RetryScheduled {
            target: "tcp".to_string(),
            attempt: 2,
            delay: Duration::from_millis(1200),
            error: "connection refused".to_string(),
        };
        let text = d.to_string();

        assert!(text.starts_with("Failed to log records for tcp"));
        assert!(text.contains("connection refused"));
        assert!(text.contains("1.2s"));
        assert!(text.contains("attempt n. 2"));
        assert_eq!(d.target(), "tcp");
    }

    #[test]
    fn test_lost_message() {
        let d = Diagnostic::BatchLost {
            target: "file".to_string(),
            records: 7,
            max_retries: 3,
        };
        assert!(d.to_string().contains("7 log records are lost"));
    }

    #[test]
    fn test_callbacks_never_panic() {
        let d = Diagnostic::TargetFailed {
            target: "console".to_string(),
            error: "broken pipe".to_string(),
        };
        stderr_diagnostics()(&d);
        silent_diagnostics()(&d);
    }
}
