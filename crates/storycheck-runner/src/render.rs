//! Progress logging for task runners.
//!
//! The observer renders every change event as one `WAIT`/`RUNS`/`PASS`/
//! `FAIL` line through `tracing`, so progress shows up wherever the
//! embedding application routes its logs.

use crate::events::{RunnerEvent, Subscription};
use crate::task_runner::{TaskRunner, TaskSnapshot};
use storycheck_core::{TaskStatus, TaskType};
use tracing::{debug, error, info};

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::NotStarted => "WAIT",
        TaskStatus::Running => "RUNS",
        TaskStatus::Succeeded => "PASS",
        TaskStatus::Failed => "FAIL",
    }
}

/// One progress line for a task state change: the status label, the task
/// description, and the error message for failures.
pub fn render_task(task: &TaskSnapshot) -> String {
    let label = status_label(task.status);
    let description = task.meta.describe(&task.id);
    match &task.error {
        Some(error) => format!("{label} {description}: {error}"),
        None => format!("{label} {description}"),
    }
}

/// Log a runner's change events until the subscription is removed.
///
/// Failures always log at error level. Successes log at info level,
/// except that the grouping tasks (`TARGET`, `TESTS`) stay quiet unless
/// `verbose` is set, since their children already reported. Non-terminal
/// transitions log at info level when `verbose`, else at debug.
///
/// The caller keeps the returned [`Subscription`] and hands it back to
/// [`TaskRunner::unsubscribe`] when rendering should stop.
pub fn attach_progress_logger<C: Send + Sync + 'static>(
    runner: &TaskRunner<C>,
    verbose: bool,
) -> Subscription {
    runner.subscribe(move |event| {
        let RunnerEvent::Change(task) = event else {
            return;
        };
        let message = render_task(task);
        match task.status {
            TaskStatus::Failed => error!("{message}"),
            TaskStatus::Succeeded => {
                let grouping =
                    matches!(task.meta.task_type, TaskType::Target | TaskType::Tests);
                if verbose || !grouping {
                    info!("{message}");
                }
            }
            _ if verbose => info!("{message}"),
            _ => debug!("{message}"),
        }
    })
}
