//! Logger factory: target registration, logger cache and shutdown

use super::config::FactoryConfig;
use super::diagnostics::{stderr_diagnostics, Diagnostic, DiagnosticCallback};
use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::logger::Logger;
use super::registry::{SharedRegistry, TargetRegistry};
use super::target::Target;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked once per target whose flush fails during
/// [`LoggerFactory::dispose`]
pub type DisposeErrorCallback = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Owner of the target registry and of one logger per name
///
/// # Example
///
/// ```
/// use rust_log_facade::prelude::*;
/// use rust_log_facade::targets::MemoryTarget;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let errors = MemoryTarget::new();
/// let factory = LoggerFactory::builder()
///     .min_level(LogLevel::Debug)
///     .build();
/// factory.add_target(Arc::new(errors.clone()), LogLevel::Error)?;
///
/// let logger = factory.get_logger("app");
/// logger.info("not for the error target").await;
/// logger.error("for the error target").await;
///
/// assert_eq!(errors.messages(), vec!["for the error target"]);
/// factory.dispose().await;
/// # Ok::<(), LoggerError>(())
/// # }).unwrap();
/// ```
pub struct LoggerFactory {
    targets: SharedRegistry,
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
    bounds: RwLock<FactoryConfig>,
    diagnostics: DiagnosticCallback,
    on_dispose_error: Option<DisposeErrorCallback>,
}

impl LoggerFactory {
    #[must_use]
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            targets: TargetRegistry::shared(),
            loggers: Mutex::new(HashMap::new()),
            bounds: RwLock::new(config),
            diagnostics: stderr_diagnostics(),
            on_dispose_error: None,
        }
    }

    #[must_use]
    pub fn builder() -> LoggerFactoryBuilder {
        LoggerFactoryBuilder::new()
    }

    /// Register `target` for records at `minimum_level` and above
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] when `minimum_level`
    /// is not a [`LogLevel`] value.
    pub fn add_target(&self, target: Arc<dyn Target>, minimum_level: impl Into<i32>) -> Result<&Self> {
        let raw = minimum_level.into();
        let level = LogLevel::try_from(raw).map_err(|_| {
            LoggerError::config("LoggerFactory", format!("Invalid minimum_level: {}", raw))
        })?;

        self.targets.write().add(level, target);
        Ok(self)
    }

    /// The logger registered under `name`, created on first use
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        let mut loggers = self.loggers.lock();
        if let Some(logger) = loggers.get(name) {
            return Arc::clone(logger);
        }

        let bounds = *self.bounds.read();
        let logger = Arc::new(Logger::new(
            name,
            Arc::clone(&self.targets),
            bounds.min_level,
            bounds.max_level,
            Arc::clone(&self.diagnostics),
        ));
        loggers.insert(name.to_string(), Arc::clone(&logger));
        logger
    }

    pub fn min_level(&self) -> LogLevel {
        self.bounds.read().min_level
    }

    pub fn max_level(&self) -> LogLevel {
        self.bounds.read().max_level
    }

    /// Minimum level for loggers created from now on
    pub fn set_min_level(&self, level: LogLevel) {
        self.bounds.write().min_level = level;
    }

    /// Maximum level for loggers created from now on
    pub fn set_max_level(&self, level: LogLevel) {
        self.bounds.write().max_level = level;
    }

    /// Number of target registrations across all levels
    pub fn target_count(&self) -> usize {
        self.targets.read().len()
    }

    /// Number of cached loggers
    pub fn logger_count(&self) -> usize {
        self.loggers.lock().len()
    }

    /// Flush every batching target
    ///
    /// Targets are flushed one after another. A failing flush is reported
    /// to the dispose error callback and to the diagnostic channel, then
    /// the next target is flushed. Returns the number of failed flushes.
    pub async fn dispose(&self) -> usize {
        let targets = self.targets.read().unique_targets();
        let mut failures = 0;

        for target in targets {
            let Some(batching) = target.as_batch_target() else {
                continue;
            };

            if let Err(error) = batching.flush().await {
                failures += 1;
                (self.diagnostics)(&Diagnostic::DisposeFailed {
                    target: target.name().to_string(),
                    error: error.to_string(),
                });
                if let Some(ref callback) = self.on_dispose_error {
                    callback(&error);
                }
            }
        }

        failures
    }
}

impl Default for LoggerFactory {
    fn default() -> Self {
        Self::new(FactoryConfig::default())
    }
}

/// Builder for constructing a [`LoggerFactory`] with a fluent API
///
/// # Example
/// ```
/// use rust_log_facade::prelude::*;
/// use rust_log_facade::targets::MemoryTarget;
/// use std::sync::Arc;
///
/// let factory = LoggerFactory::builder()
///     .min_level(LogLevel::Debug)
///     .target(Arc::new(MemoryTarget::new()), LogLevel::Information)
///     .on_dispose_error(Arc::new(|err| {
///         eprintln!("ALERT: flush failed: {}", err);
///     }))
///     .build();
///
/// assert_eq!(factory.target_count(), 1);
/// ```
pub struct LoggerFactoryBuilder {
    config: FactoryConfig,
    targets: Vec<(Arc<dyn Target>, LogLevel)>,
    diagnostics: Option<DiagnosticCallback>,
    on_dispose_error: Option<DisposeErrorCallback>,
}

impl LoggerFactoryBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: FactoryConfig::default(),
            targets: Vec::new(),
            diagnostics: None,
            on_dispose_error: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.config.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_level(mut self, level: LogLevel) -> Self {
        self.config.max_level = level;
        self
    }

    /// Register a target; see [`LoggerFactory::add_target`]
    #[must_use = "builder methods return a new value"]
    pub fn target(mut self, target: Arc<dyn Target>, minimum_level: LogLevel) -> Self {
        self.targets.push((target, minimum_level));
        self
    }

    /// Channel for target failures reported by loggers and dispose
    #[must_use = "builder methods return a new value"]
    pub fn diagnostics(mut self, diagnostics: DiagnosticCallback) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_dispose_error(mut self, callback: DisposeErrorCallback) -> Self {
        self.on_dispose_error = Some(callback);
        self
    }

    pub fn build(self) -> LoggerFactory {
        let mut factory = LoggerFactory::new(self.config);
        if let Some(diagnostics) = self.diagnostics {
            factory.diagnostics = diagnostics;
        }
        factory.on_dispose_error = self.on_dispose_error;

        {
            let mut registry = factory.targets.write();
            for (target, level) in self.targets {
                registry.add(level, target);
            }
        }

        factory
    }
}

impl Default for LoggerFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
