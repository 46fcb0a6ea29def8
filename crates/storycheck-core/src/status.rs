//! Task status vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a task inside a runner.
///
/// Transitions are one-directional: `NotStarted -> Running -> Succeeded`
/// or `NotStarted -> Running -> Failed`. A task that is filtered out or
/// never scheduled stays `NotStarted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task exists but its work has not been started.
    #[default]
    NotStarted,
    /// Task work is in flight.
    Running,
    /// Task work completed without error.
    Succeeded,
    /// Task work completed with an error.
    Failed,
}

impl TaskStatus {
    /// Returns true if the task has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if the task is still active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Wire name of the status, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
