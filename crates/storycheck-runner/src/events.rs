//! Runner event subscriptions.

use crate::task_runner::TaskSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Events emitted by a task runner.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    /// A task changed state; carries the task's full snapshot, including
    /// any entered sub-runner.
    Change(TaskSnapshot),
    /// The run finished, successfully or not. Emitted exactly once per
    /// run, after all started work has settled.
    End,
}

/// Handle returned by `subscribe`, used to remove the callback again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

pub(crate) type Callback = Arc<dyn Fn(&RunnerEvent) + Send + Sync>;

/// Ordered list of subscriber callbacks.
///
/// Emission snapshots the list first, so a callback may subscribe,
/// unsubscribe, or query runner state without deadlocking.
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Callback)>>,
}

impl Subscribers {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, callback: Callback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().unwrap().push((id, callback));
        Subscription(id)
    }

    pub(crate) fn unsubscribe(&self, subscription: Subscription) {
        self.entries
            .lock()
            .unwrap()
            .retain(|(id, _)| *id != subscription.0);
    }

    /// Deliver `event` to every subscriber, in subscription order.
    pub(crate) fn emit(&self, event: &RunnerEvent) {
        let callbacks: Vec<Callback> = {
            let entries = self.entries.lock().unwrap();
            entries.iter().map(|(_, callback)| callback.clone()).collect()
        };
        for callback in callbacks {
            callback(event);
        }
    }
}
