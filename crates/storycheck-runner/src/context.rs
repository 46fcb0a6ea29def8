//! Shared state for one test run.

use std::sync::{Arc, Mutex};
use storycheck_core::Target;

/// Context handed to every task of a test run.
///
/// Tracks which targets are currently started so the driver can stop
/// them when a run aborts before its stop tasks execute. The lock is
/// never held across an await.
#[derive(Default)]
pub struct RunContext {
    active_targets: Mutex<Vec<Arc<dyn Target>>>,
}

impl RunContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a target as started.
    pub fn register_target(&self, target: Arc<dyn Target>) {
        self.active_targets.lock().unwrap().push(target);
    }

    /// Remove a stopped target from the active set.
    pub fn release_target(&self, target: &Arc<dyn Target>) {
        self.active_targets
            .lock()
            .unwrap()
            .retain(|active| !Arc::ptr_eq(active, target));
    }

    /// Snapshot of the currently active targets.
    pub fn active_targets(&self) -> Vec<Arc<dyn Target>> {
        self.active_targets.lock().unwrap().clone()
    }

    /// Drain the active set, handing the targets to cleanup.
    pub fn take_active_targets(&self) -> Vec<Arc<dyn Target>> {
        std::mem::take(&mut *self.active_targets.lock().unwrap())
    }
}
