//! Task definitions and the batch plumbing built from them.

use crate::error::RunnerError;
use crate::task_runner::TaskRunner;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use storycheck_core::{TaskId, TaskMeta};

/// Boxed unit of async work, invoked with the run context.
pub type UnitWork<C> =
    Box<dyn FnOnce(Arc<C>) -> BoxFuture<'static, Result<(), RunnerError>> + Send>;

/// Boxed factory producing a nested runner from the run context.
pub type NestedWork<C> = Box<dyn FnOnce(Arc<C>) -> Result<TaskRunner<C>, RunnerError> + Send>;

/// Work carried by one task.
///
/// The shape is fixed when the definition is built: either one async
/// job, or a factory for a sub-runner. The factory runs only when the
/// task starts, so it can consume data produced by earlier tasks.
pub enum TaskWork<C> {
    /// One async job.
    Unit(UnitWork<C>),
    /// Factory for a sub-runner whose run becomes this task's work.
    Nested(NestedWork<C>),
}

impl<C: Send + Sync + 'static> TaskWork<C> {
    /// Turn this work into an execution for the given context.
    ///
    /// A nested factory that fails to build becomes an execution that
    /// fails immediately with the factory's error.
    pub fn into_execution(self, context: Arc<C>) -> Execution<C> {
        match self {
            TaskWork::Unit(work) => Execution::Future(work(context)),
            TaskWork::Nested(build) => match build(context) {
                Ok(runner) => Execution::Runner(runner),
                Err(err) => Execution::Future(Box::pin(async move { Err(err) })),
            },
        }
    }
}

/// Input describing one task of a runner.
pub struct TaskDefinition<C> {
    /// Optional explicit id; unnamed tasks are identified by their
    /// position in the filtered task list.
    pub id: Option<String>,
    /// Metadata shown to observers and batch executors.
    pub meta: TaskMeta,
    /// The task's work.
    pub work: TaskWork<C>,
    /// Disabled definitions are dropped before the runner is built.
    pub enabled: bool,
}

impl<C: Send + Sync + 'static> TaskDefinition<C> {
    /// Define a task around one async job.
    pub fn unit<F, Fut>(meta: TaskMeta, work: F) -> Self
    where
        F: FnOnce(Arc<C>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), RunnerError>> + Send + 'static,
    {
        Self {
            id: None,
            meta,
            work: TaskWork::Unit(Box::new(move |context| Box::pin(work(context)))),
            enabled: true,
        }
    }

    /// Define a task that enters a nested runner built on demand.
    pub fn nested<F>(meta: TaskMeta, build: F) -> Self
    where
        F: FnOnce(Arc<C>) -> Result<TaskRunner<C>, RunnerError> + Send + 'static,
    {
        Self {
            id: None,
            meta,
            work: TaskWork::Nested(Box::new(build)),
            enabled: true,
        }
    }

    /// Builder method to set an explicit id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method to enable or disable the task.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A task admitted to a run, as handed to batch builders and executors.
///
/// Holds the task's consumable work, so a batch strategy can regroup or
/// drop tasks but never duplicate one.
pub struct ScheduledTask<C> {
    pub(crate) index: usize,
    /// Task id.
    pub id: TaskId,
    /// Task metadata.
    pub meta: TaskMeta,
    /// The task's work, consumed by whichever execution runs it.
    pub work: TaskWork<C>,
}

impl<C: Send + Sync + 'static> ScheduledTask<C> {
    /// The default executor behavior for one task: its own work becomes
    /// its execution.
    pub fn into_execution(self, context: Arc<C>) -> Execution<C> {
        self.work.into_execution(context)
    }
}

/// What a batch executor produces for one task slot.
pub enum Execution<C> {
    /// An async job to await.
    Future(BoxFuture<'static, Result<(), RunnerError>>),
    /// A sub-runner to enter under the slot's task.
    Runner(TaskRunner<C>),
}
