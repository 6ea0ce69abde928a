//! Configuration for batching targets and logger factories
//!
//! [`BatchConfig`] is the raw, deserializable form. It is checked once by
//! [`BatchConfig::validate`] and turned into [`BatchSettings`], which the
//! pipeline uses from then on.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const COMPONENT: &str = "BatchingTarget";

/// Raw batching configuration
///
/// # Example
///
/// ```
/// use rust_log_facade::BatchConfig;
///
/// let config: BatchConfig = serde_json::from_str(
///     r#"{ "max_size": 100, "retry_delay": 0.25 }"#,
/// ).unwrap();
///
/// let settings = config.validate().unwrap();
/// assert_eq!(settings.threshold(), 100);
/// assert_eq!(settings.max_retries(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Buffer length that triggers a flush; at least 2
    pub max_size: i64,
    /// Failed attempts retried before the fallback is used
    pub max_retries: u32,
    /// Base delay between attempts, in seconds
    pub retry_delay: f64,
    /// Multiply the base delay by the attempt number
    pub progressive_delay: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: 500,
            max_retries: 3,
            retry_delay: 0.6,
            progressive_delay: true,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_size(mut self, max_size: i64) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base retry delay in seconds
    #[must_use = "builder methods return a new value"]
    pub fn retry_delay(mut self, seconds: f64) -> Self {
        self.retry_delay = seconds;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn progressive_delay(mut self, progressive: bool) -> Self {
        self.progressive_delay = progressive;
        self
    }

    /// Check the configuration and convert it into [`BatchSettings`]
    pub fn validate(&self) -> Result<BatchSettings> {
        if self.max_size < 2 {
            return Err(LoggerError::config(
                COMPONENT,
                "max_size must be positive and greater than 1",
            ));
        }

        if !self.retry_delay.is_finite() || self.retry_delay < 0.0 {
            return Err(LoggerError::config(
                COMPONENT,
                "retry_delay must be a positive number, to disable delays use max_retries parameter",
            ));
        }

        let retry_delay = Duration::try_from_secs_f64(self.retry_delay).map_err(|_| {
            LoggerError::config(COMPONENT, "retry_delay is too large to be represented as a duration")
        })?;

        let threshold = usize::try_from(self.max_size)
            .map_err(|_| LoggerError::config(COMPONENT, "max_size does not fit in memory"))?;

        Ok(BatchSettings {
            threshold,
            max_retries: self.max_retries,
            retry_delay,
            progressive_delay: self.progressive_delay,
        })
    }
}

/// Validated batching settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    threshold: usize,
    max_retries: u32,
    retry_delay: Duration,
    progressive_delay: bool,
}

impl BatchSettings {
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn progressive_delay(&self) -> bool {
        self.progressive_delay
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.progressive_delay {
            self.retry_delay.saturating_mul(attempt)
        } else {
            self.retry_delay
        }
    }
}

/// Level bounds given to every logger a factory creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    pub min_level: LogLevel,
    pub max_level: LogLevel,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Information,
            max_level: LogLevel::MAX,
        }
    }
}
