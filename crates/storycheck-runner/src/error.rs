//! Engine errors and the end-of-run aggregate.

use storycheck_core::CoreError;
use thiserror::Error;

/// Errors surfaced by runners and by the work running inside them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunnerError {
    /// Runner options failed validation, or a batch strategy misbehaved.
    #[error("invalid runner configuration: {0}")]
    InvalidConfig(String),

    /// `run` was called a second time on the same runner.
    #[error("this runner has already been run")]
    AlreadyRan,

    /// Domain failure from a target, the pipeline, or a decorator.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Aggregated task failures from a completed run.
    #[error(transparent)]
    Aggregate(#[from] TaskRunnerError),
}

impl RunnerError {
    /// Shorthand for [`RunnerError::InvalidConfig`].
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Partial-failure summary of one run.
///
/// `errors` is always flat: building an aggregate splices the contents
/// of any nested aggregate in place of the nested error itself, so a
/// consumer can scan leaf failures without recursing.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct TaskRunnerError {
    /// Human-readable summary of the run outcome.
    pub message: String,
    /// Underlying task failures, in task list order.
    pub errors: Vec<RunnerError>,
}

impl TaskRunnerError {
    /// Build an aggregate from per-task errors, splicing nested
    /// aggregates flat.
    pub fn flatten(message: impl Into<String>, task_errors: Vec<RunnerError>) -> Self {
        let mut errors = Vec::with_capacity(task_errors.len());
        for error in task_errors {
            match error {
                RunnerError::Aggregate(inner) => errors.extend(inner.errors),
                other => errors.push(other),
            }
        }
        Self {
            message: message.into(),
            errors,
        }
    }

    /// True when every aggregated failure boils down to a snapshot
    /// failure (mismatch, missing reference, or failed capture), i.e.
    /// the run infrastructure itself worked.
    pub fn all_snapshot_failures(&self) -> bool {
        !self.errors.is_empty()
            && self.errors.iter().all(|error| match error {
                RunnerError::Core(core) => core.is_snapshot_failure(),
                _ => false,
            })
    }
}
