//! Targets grouped by minimum level

use super::log_level::LogLevel;
use super::target::Target;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry shared between a factory (the only writer) and its loggers
pub type SharedRegistry = Arc<RwLock<TargetRegistry>>;

/// One bucket of targets per level, every level present
pub struct TargetRegistry {
    buckets: BTreeMap<LogLevel, Vec<Arc<dyn Target>>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self {
            buckets: LogLevel::ALL.iter().map(|level| (*level, Vec::new())).collect(),
        }
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Append `target` to the bucket of `minimum_level`
    pub fn add(&mut self, minimum_level: LogLevel, target: Arc<dyn Target>) {
        self.buckets.entry(minimum_level).or_default().push(target);
    }

    /// Snapshot of one bucket, in registration order
    pub fn bucket(&self, level: LogLevel) -> Vec<Arc<dyn Target>> {
        self.buckets.get(&level).cloned().unwrap_or_default()
    }

    /// Every registered target once, buckets ascending, registration order
    /// within a bucket
    pub fn unique_targets(&self) -> Vec<Arc<dyn Target>> {
        let mut seen: Vec<*const ()> = Vec::new();
        let mut targets = Vec::new();

        for target in self.buckets.values().flatten() {
            let ptr = Arc::as_ptr(target) as *const ();
            if !seen.contains(&ptr) {
                seen.push(ptr);
                targets.push(Arc::clone(target));
            }
        }
        targets
    }

    /// Number of registrations across all buckets
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
