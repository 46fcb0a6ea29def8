//! Batch execution strategy for story captures.

use crate::compare::compare_screenshot;
use crate::config::TestOptions;
use crate::context::RunContext;
use crate::error::RunnerError;
use crate::paths::FileNameFormatter;
use crate::task::Execution;
use crate::task_runner::{default_batch_execute, BatchExecutor};
use std::collections::BTreeMap;
use std::sync::Arc;
use storycheck_core::{Configuration, CoreError, ImageDiffer, StoryRequest, Target};
use tokio::sync::oneshot;

/// Batch executor for test tasks against a given target.
///
/// For targets with batch capture support, the whole batch becomes one
/// bulk capture call dispatched on its own task; each slot waits for its
/// own screenshot and resolves or fails independently, so one broken
/// story never blocks its batch siblings. A failure of the bulk call
/// itself fails every slot. Targets without batch support fall back to
/// each task's own work, which captures stories one at a time.
pub fn story_batch_executor(
    target: Arc<dyn Target>,
    differ: Arc<dyn ImageDiffer>,
    options: Arc<TestOptions>,
    formatter: FileNameFormatter,
    tolerance: f64,
    configurations: Arc<BTreeMap<String, Configuration>>,
) -> BatchExecutor<RunContext> {
    Arc::new(move |batch, context| {
        if !target.supports_batch_capture() {
            return default_batch_execute(batch, context);
        }

        let mut executions: Vec<Execution<RunContext>> = Vec::with_capacity(batch.len());
        let mut dispatch: Vec<(StoryRequest, oneshot::Sender<Result<Vec<u8>, CoreError>>)> =
            Vec::new();

        for task in batch {
            let (story, configuration_name) =
                match (task.meta.story.clone(), task.meta.configuration.clone()) {
                    (Some(story), Some(name)) => (story, name),
                    _ => {
                        executions.push(Execution::Future(Box::pin(async {
                            Err(RunnerError::invalid_config(
                                "batch capture requires story metadata on test tasks",
                            ))
                        })));
                        continue;
                    }
                };
            let Some(configuration) = configurations.get(&configuration_name).cloned() else {
                executions.push(Execution::Future(Box::pin(async move {
                    Err(RunnerError::Core(CoreError::target(format!(
                        "unknown configuration \"{configuration_name}\""
                    ))))
                })));
                continue;
            };

            let (sender, receiver) = oneshot::channel();
            dispatch.push((
                StoryRequest {
                    story: story.clone(),
                    configuration_name: configuration_name.clone(),
                    configuration,
                },
                sender,
            ));

            let differ = differ.clone();
            let options = options.clone();
            let formatter = formatter.clone();
            executions.push(Execution::Future(Box::pin(async move {
                let screenshot = receiver
                    .await
                    .map_err(|_| CoreError::target("batch capture was abandoned"))??;
                compare_screenshot(
                    Some(screenshot),
                    differ.as_ref(),
                    &options,
                    &formatter,
                    tolerance,
                    &configuration_name,
                    &story,
                )
                .await
                .map_err(RunnerError::from)
            })));
        }

        if !dispatch.is_empty() {
            let target = target.clone();
            let capture = options.capture.clone();
            tokio::spawn(async move {
                let (requests, senders): (Vec<_>, Vec<_>) = dispatch.into_iter().unzip();
                match target.capture_screenshots_for_stories(&requests, &capture).await {
                    Ok(results) => {
                        let mut results = results.into_iter();
                        for sender in senders {
                            let slot = results.next().unwrap_or_else(|| {
                                Err(CoreError::target(
                                    "bulk capture returned fewer screenshots than requested",
                                ))
                            });
                            let _ = sender.send(slot);
                        }
                    }
                    Err(error) => {
                        for sender in senders {
                            let _ = sender.send(Err(error.clone()));
                        }
                    }
                }
            });
        }

        executions
    })
}
