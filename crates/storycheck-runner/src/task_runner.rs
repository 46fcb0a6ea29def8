//! The hierarchical concurrent task runner.
//!
//! A runner owns an ordered list of tasks, executes them in batches with
//! bounded concurrency, tracks per-task status for observers, and
//! aggregates partial failures at the end of the run. Tasks may enter
//! nested runners, forming a tree whose state is visible from the root.

use crate::concurrent::each_of_limit;
use crate::error::{RunnerError, TaskRunnerError};
use crate::events::{RunnerEvent, Subscribers, Subscription};
use crate::task::{Execution, ScheduledTask, TaskDefinition, TaskWork};
use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture};
use std::sync::{Arc, Mutex};
use storycheck_core::{TaskId, TaskMeta, TaskStatus};

/// Groups scheduled tasks into the batches a run executes.
pub type BatchBuilder<C> =
    Arc<dyn Fn(Vec<ScheduledTask<C>>, usize) -> Vec<Vec<ScheduledTask<C>>> + Send + Sync>;

/// Maps one batch of tasks to one execution per task, in matching order.
pub type BatchExecutor<C> =
    Arc<dyn Fn(Vec<ScheduledTask<C>>, Arc<C>) -> Vec<Execution<C>> + Send + Sync>;

/// Tuning for one runner.
pub struct RunnerOptions<C> {
    /// How many batches may be in flight at once.
    pub concurrency: usize,
    /// How many tasks go into one batch.
    pub batch_size: usize,
    /// Stop scheduling new batches after the first failure.
    pub exit_on_error: bool,
    /// Batch grouping strategy.
    pub batch_builder: BatchBuilder<C>,
    /// Batch execution strategy.
    pub batch_executor: BatchExecutor<C>,
}

impl<C: Send + Sync + 'static> Default for RunnerOptions<C> {
    fn default() -> Self {
        Self {
            concurrency: 1,
            batch_size: 1,
            exit_on_error: true,
            batch_builder: Arc::new(|tasks, size| chunk_batches(tasks, size)),
            batch_executor: Arc::new(default_batch_execute),
        }
    }
}

impl<C: Send + Sync + 'static> RunnerOptions<C> {
    /// Builder method to set the batch concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Builder method to set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder method to set the fail-fast behavior.
    pub fn with_exit_on_error(mut self, exit_on_error: bool) -> Self {
        self.exit_on_error = exit_on_error;
        self
    }

    /// Builder method to replace the batch grouping strategy.
    pub fn with_batch_builder(mut self, batch_builder: BatchBuilder<C>) -> Self {
        self.batch_builder = batch_builder;
        self
    }

    /// Builder method to replace the batch execution strategy.
    pub fn with_batch_executor(mut self, batch_executor: BatchExecutor<C>) -> Self {
        self.batch_executor = batch_executor;
        self
    }
}

/// Point-in-time view of one task; also the change-event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    /// Task id.
    pub id: TaskId,
    /// Task metadata.
    pub meta: TaskMeta,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// The failure recorded for the task, if any.
    pub error: Option<RunnerError>,
    /// When the task entered `Running`.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// State of the entered sub-runner, for nested tasks.
    pub tasks: Option<Vec<TaskSnapshot>>,
}

struct TaskState<C> {
    status: TaskStatus,
    error: Option<RunnerError>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    child: Option<Arc<TaskRunner<C>>>,
}

struct TaskEntry<C> {
    id: TaskId,
    meta: TaskMeta,
    state: Mutex<TaskState<C>>,
}

impl<C: Send + Sync + 'static> TaskEntry<C> {
    fn snapshot(&self) -> TaskSnapshot {
        let state = self.state.lock().unwrap();
        TaskSnapshot {
            id: self.id.clone(),
            meta: self.meta.clone(),
            status: state.status,
            error: state.error.clone(),
            started_at: state.started_at,
            completed_at: state.completed_at,
            tasks: state.child.as_ref().map(|child| child.get_state()),
        }
    }
}

/// Concurrency-bounded, fault-tolerant scheduler for a list of tasks.
///
/// Construct it with [`TaskRunner::new`], observe it through
/// [`TaskRunner::subscribe`] and [`TaskRunner::get_state`], and execute
/// it once with [`TaskRunner::run`].
pub struct TaskRunner<C> {
    entries: Vec<Arc<TaskEntry<C>>>,
    pending: Mutex<Option<Vec<TaskWork<C>>>>,
    concurrency: usize,
    batch_size: usize,
    exit_on_error: bool,
    batch_builder: BatchBuilder<C>,
    batch_executor: BatchExecutor<C>,
    subscribers: Arc<Subscribers>,
}

impl<C: Send + Sync + 'static> TaskRunner<C> {
    /// Build a runner from task definitions.
    ///
    /// Definitions with `enabled == false` are dropped; the remaining
    /// tasks get their explicit id or their position in the filtered
    /// list. Fails with `InvalidConfig` when `concurrency` or
    /// `batch_size` is zero.
    pub fn new(
        definitions: Vec<TaskDefinition<C>>,
        options: RunnerOptions<C>,
    ) -> Result<Self, RunnerError> {
        if options.concurrency == 0 {
            return Err(RunnerError::invalid_config("concurrency must be at least 1"));
        }
        if options.batch_size == 0 {
            return Err(RunnerError::invalid_config("batch size must be at least 1"));
        }

        let mut entries = Vec::new();
        let mut works = Vec::new();
        for definition in definitions.into_iter().filter(|d| d.enabled) {
            let id = match definition.id {
                Some(name) => TaskId::Named(name),
                None => TaskId::Index(entries.len()),
            };
            entries.push(Arc::new(TaskEntry {
                id,
                meta: definition.meta,
                state: Mutex::new(TaskState {
                    status: TaskStatus::NotStarted,
                    error: None,
                    started_at: None,
                    completed_at: None,
                    child: None,
                }),
            }));
            works.push(definition.work);
        }

        Ok(Self {
            entries,
            pending: Mutex::new(Some(works)),
            concurrency: options.concurrency,
            batch_size: options.batch_size,
            exit_on_error: options.exit_on_error,
            batch_builder: options.batch_builder,
            batch_executor: options.batch_executor,
            subscribers: Arc::new(Subscribers::new()),
        })
    }

    /// Ordered snapshot of every task, recursive through entered
    /// sub-runners. Safe to call while `run` is in progress; repeated
    /// calls without intervening progress return equal snapshots.
    pub fn get_state(&self) -> Vec<TaskSnapshot> {
        self.entries.iter().map(|entry| entry.snapshot()).collect()
    }

    /// Register a callback for change and end events.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&RunnerEvent) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(Arc::new(callback))
    }

    /// Remove a previously registered callback.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers.unsubscribe(subscription);
    }

    /// Execute all tasks and settle every started one.
    ///
    /// Returns `Ok(())` when every task succeeded, the flat
    /// [`TaskRunnerError`] aggregate when any task failed, and the bare
    /// abort error only when a fail-fast abort left no task failure
    /// behind. An `End` event is emitted on every exit path, after all
    /// started work has settled. A second call returns `AlreadyRan`.
    pub async fn run(&self, context: Arc<C>) -> Result<(), RunnerError> {
        let works = self
            .pending
            .lock()
            .unwrap()
            .take()
            .ok_or(RunnerError::AlreadyRan)?;

        let scheduled: Vec<ScheduledTask<C>> = works
            .into_iter()
            .zip(&self.entries)
            .enumerate()
            .map(|(index, (work, entry))| ScheduledTask {
                index,
                id: entry.id.clone(),
                meta: entry.meta.clone(),
                work,
            })
            .collect();

        let batches = (self.batch_builder)(scheduled, self.batch_size);

        let caught = each_of_limit(batches, self.concurrency, |_, batch| {
            self.run_batch(batch, context.clone())
        })
        .await
        .err();

        self.subscribers.emit(&RunnerEvent::End);

        let mut task_errors = Vec::new();
        for entry in &self.entries {
            let state = entry.state.lock().unwrap();
            if state.status == TaskStatus::Failed {
                if let Some(error) = state.error.clone() {
                    task_errors.push(error);
                }
            }
        }
        if !task_errors.is_empty() {
            return Err(TaskRunnerError::flatten("Some tasks failed to run", task_errors).into());
        }
        match caught {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn run_batch(
        &self,
        batch: Vec<ScheduledTask<C>>,
        context: Arc<C>,
    ) -> Result<(), RunnerError> {
        let slots: Vec<usize> = batch.iter().map(|task| task.index).collect();
        for &slot in &slots {
            self.mark_running(slot);
        }

        let executions = (self.batch_executor)(batch, context.clone());
        let provided = executions.len();

        let drivers: Vec<_> = slots
            .iter()
            .zip(executions)
            .map(|(&slot, execution)| self.drive_slot(slot, execution, context.clone()))
            .collect();

        // Slots the executor left unanswered fail outright.
        let mut batch_error: Option<RunnerError> = None;
        for &slot in slots.iter().skip(provided) {
            let error =
                RunnerError::invalid_config("batch executor returned fewer executions than tasks");
            self.mark_failed(slot, error.clone());
            if self.exit_on_error {
                batch_error.get_or_insert(error);
            }
        }

        for result in join_all(drivers).await {
            if let Err(error) = result {
                batch_error.get_or_insert(error);
            }
        }

        match batch_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    // Boxed return type so the recursive future's auto traits are
    // known without inspecting the cycle run -> run_batch -> drive_slot.
    fn drive_slot(
        &self,
        slot: usize,
        execution: Execution<C>,
        context: Arc<C>,
    ) -> BoxFuture<'_, Result<(), RunnerError>> {
        Box::pin(async move {
            let result = match execution {
                Execution::Future(future) => future.await,
                Execution::Runner(runner) => {
                    let child = Arc::new(runner);
                    self.attach_child(slot, child.clone());
                    let forward = self.subscribers.clone();
                    child.subscribe(move |event| {
                        if let RunnerEvent::Change(task) = event {
                            forward.emit(&RunnerEvent::Change(task.clone()));
                        }
                    });
                    child.run(context).await
                }
            };

            match result {
                Ok(()) => {
                    self.mark_succeeded(slot);
                    Ok(())
                }
                Err(error) => {
                    self.mark_failed(slot, error.clone());
                    if self.exit_on_error {
                        Err(error)
                    } else {
                        Ok(())
                    }
                }
            }
        })
    }

    fn mark_running(&self, slot: usize) {
        {
            let mut state = self.entries[slot].state.lock().unwrap();
            state.status = TaskStatus::Running;
            state.started_at = Some(Utc::now());
        }
        self.emit_change(slot);
    }

    fn mark_succeeded(&self, slot: usize) {
        {
            let mut state = self.entries[slot].state.lock().unwrap();
            state.status = TaskStatus::Succeeded;
            state.completed_at = Some(Utc::now());
        }
        self.emit_change(slot);
    }

    fn mark_failed(&self, slot: usize, error: RunnerError) {
        {
            let mut state = self.entries[slot].state.lock().unwrap();
            state.status = TaskStatus::Failed;
            state.error = Some(error);
            state.completed_at = Some(Utc::now());
        }
        self.emit_change(slot);
    }

    // The child shows up in the next emitted snapshot; there is no
    // dedicated attach event.
    fn attach_child(&self, slot: usize, child: Arc<TaskRunner<C>>) {
        let mut state = self.entries[slot].state.lock().unwrap();
        state.child = Some(child);
    }

    fn emit_change(&self, slot: usize) {
        let snapshot = self.entries[slot].snapshot();
        self.subscribers.emit(&RunnerEvent::Change(snapshot));
    }
}

/// Default batch builder: contiguous chunks of `chunk_size` items, the
/// last chunk possibly smaller.
pub fn chunk_batches<T>(items: Vec<T>, chunk_size: usize) -> Vec<Vec<T>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks: Vec<Vec<T>> = Vec::with_capacity(items.len().div_ceil(chunk_size));
    let mut chunk: Vec<T> = Vec::new();
    for item in items {
        chunk.push(item);
        if chunk.len() == chunk_size {
            chunks.push(std::mem::take(&mut chunk));
        }
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

/// Default batch executor: each task's own work becomes its execution.
pub fn default_batch_execute<C: Send + Sync + 'static>(
    batch: Vec<ScheduledTask<C>>,
    context: Arc<C>,
) -> Vec<Execution<C>> {
    batch
        .into_iter()
        .map(|task| task.into_execution(context.clone()))
        .collect()
}
