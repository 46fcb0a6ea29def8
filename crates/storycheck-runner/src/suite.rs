//! The test orchestration driver.
//!
//! A [`TestSuite`] owns the run options, the image differ, and the
//! registered targets. For every target referenced by the selected
//! configurations it builds one task tree (prepare, start, fetch
//! stories, tests, stop), runs the trees through a task runner, and
//! stops any target still active when a run aborts before its stop task.

use crate::batch::story_batch_executor;
use crate::compare::compare_screenshot;
use crate::config::{compile_filter, filter_configurations, TestOptions};
use crate::context::RunContext;
use crate::error::RunnerError;
use crate::failure::{with_retries, with_timeout};
use crate::fs::{empty_dir, ensure_dir, place_gitignore};
use crate::paths::{default_file_name, FileNameFormatter};
use crate::render::attach_progress_logger;
use crate::task::TaskDefinition;
use crate::task_runner::{BatchBuilder, RunnerOptions, TaskRunner};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use storycheck_core::{
    Configuration, CoreError, ImageDiffer, Story, Target, TaskMeta, TaskType,
};
use tracing::{info, warn};

/// How one registered target participates in a run.
pub struct TargetSetup {
    /// The capture environment.
    pub target: Arc<dyn Target>,
    /// Capture concurrency for this target; defaults to the run-wide
    /// setting.
    pub concurrency: Option<usize>,
    /// Diff tolerance for this target; defaults to the run-wide setting.
    pub tolerance: Option<f64>,
    /// How many test tasks go into one capture batch.
    pub batch_size: usize,
    /// Batch grouping override for this target's tests runner.
    pub batch_builder: Option<BatchBuilder<RunContext>>,
}

impl TargetSetup {
    /// Set up a target with the run-wide defaults.
    pub fn new(target: Arc<dyn Target>) -> Self {
        Self {
            target,
            concurrency: None,
            tolerance: None,
            batch_size: 1,
            batch_builder: None,
        }
    }

    /// Builder method to override the capture concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Builder method to override the diff tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Builder method to set the capture batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder method to replace the batch grouping strategy.
    pub fn with_batch_builder(mut self, batch_builder: BatchBuilder<RunContext>) -> Self {
        self.batch_builder = Some(batch_builder);
        self
    }
}

/// Everything a story capture task needs besides the story itself.
#[derive(Clone)]
struct StoryPipeline {
    target: Arc<dyn Target>,
    differ: Arc<dyn ImageDiffer>,
    options: Arc<TestOptions>,
    formatter: FileNameFormatter,
    tolerance: f64,
}

impl StoryPipeline {
    /// Capture one story within the configured timeout and retry budget.
    async fn capture(
        &self,
        story: &Story,
        configuration: &Configuration,
    ) -> Result<Option<Vec<u8>>, CoreError> {
        let capture = &self.options.capture;
        let operation = format!("capture of \"{}\"", story.full_name());
        with_retries(&operation, capture.retries, capture.backoff, || {
            with_timeout(
                capture.timeout,
                &operation,
                self.target.capture_screenshot_for_story(story, capture, configuration),
            )
        })
        .await
    }
}

/// Drives visual tests for a set of configurations against registered
/// targets.
pub struct TestSuite {
    options: Arc<TestOptions>,
    differ: Arc<dyn ImageDiffer>,
    targets: BTreeMap<String, TargetSetup>,
    file_name_formatter: FileNameFormatter,
}

impl TestSuite {
    /// Create a suite with the default screenshot file naming.
    pub fn new(options: TestOptions, differ: Arc<dyn ImageDiffer>) -> Self {
        Self {
            options: Arc::new(options),
            differ,
            targets: BTreeMap::new(),
            file_name_formatter: Arc::new(default_file_name),
        }
    }

    /// Builder method to replace the screenshot file naming.
    pub fn with_file_name_formatter(mut self, formatter: FileNameFormatter) -> Self {
        self.file_name_formatter = formatter;
        self
    }

    /// Make a target available under its configuration name.
    pub fn register_target(&mut self, name: impl Into<String>, setup: TargetSetup) {
        self.targets.insert(name.into(), setup);
    }

    /// Run visual tests for every configuration selected by the options'
    /// target and configuration filters.
    ///
    /// Matching nothing is a pass. Configurations naming an unregistered
    /// target fail the run up front. Any other failure surfaces as the
    /// runner's aggregate after every started target has been stopped,
    /// either by its own stop task or by this driver's cleanup.
    pub async fn run(
        &self,
        configurations: &BTreeMap<String, Configuration>,
    ) -> Result<(), RunnerError> {
        let selected = filter_configurations(
            configurations,
            self.options.target_filter.as_deref(),
            self.options.configuration_filter.as_deref(),
        )?;
        if selected.is_empty() {
            warn!("No matching configurations");
            return Ok(());
        }

        self.prepare_directories().await?;

        let groups = group_by_target(&selected);
        info!(
            configurations = selected.len(),
            targets = groups.len(),
            "Starting visual tests"
        );

        let mut definitions = Vec::with_capacity(groups.len());
        for (target_name, group) in groups {
            let setup = self
                .targets
                .get(&target_name)
                .ok_or_else(|| CoreError::target(format!("unknown target \"{target_name}\"")))?;
            definitions.push(self.target_task(&target_name, setup, group));
        }

        let runner = TaskRunner::new(definitions, RunnerOptions::default())?;
        let progress = (!self.options.silent)
            .then(|| attach_progress_logger(&runner, self.options.verbose));

        let context = Arc::new(RunContext::new());
        let result = runner.run(context.clone()).await;
        if let Some(subscription) = progress {
            runner.unsubscribe(subscription);
        }

        if let Err(error) = result {
            stop_active_targets(&context).await;
            return Err(error);
        }
        Ok(())
    }

    /// When updating references only the reference directory has to
    /// exist; regular runs start from empty work directories kept out of
    /// version control.
    async fn prepare_directories(&self) -> Result<(), CoreError> {
        if self.options.update_reference {
            ensure_dir(&self.options.reference_dir).await?;
        } else {
            empty_dir(&self.options.output_dir).await?;
            empty_dir(&self.options.difference_dir).await?;
            place_gitignore(&[
                self.options.output_dir.clone(),
                self.options.difference_dir.clone(),
            ])
            .await?;
        }
        Ok(())
    }

    /// The task tree for one target and the configurations it captures.
    ///
    /// The stop task only runs when everything before it succeeded; a
    /// fetch or tests failure aborts the tree and leaves the target in
    /// the context for the driver's cleanup.
    fn target_task(
        &self,
        target_name: &str,
        setup: &TargetSetup,
        configurations: BTreeMap<String, Configuration>,
    ) -> TaskDefinition<RunContext> {
        let name = target_name.to_owned();
        let target = setup.target.clone();
        let pipeline = StoryPipeline {
            target: target.clone(),
            differ: self.differ.clone(),
            options: self.options.clone(),
            formatter: self.file_name_formatter.clone(),
            tolerance: setup.tolerance.unwrap_or(self.options.tolerance),
        };
        let concurrency = setup.concurrency.unwrap_or(self.options.concurrency).max(1);
        let batch_size = setup.batch_size.max(1);
        let batch_builder = setup.batch_builder.clone();
        let id = name.clone();

        TaskDefinition::nested(TaskMeta::target(target_name), move |_| {
            // Filled by the fetch task, consumed by the tests factory.
            let storybook: Arc<Mutex<Option<Vec<Story>>>> = Arc::new(Mutex::new(None));
            let configurations = Arc::new(configurations);

            let prepare = {
                let target = target.clone();
                let enabled = target.needs_prepare();
                TaskDefinition::unit(
                    TaskMeta::step(TaskType::Prepare, name.as_str()),
                    move |_| async move {
                        target.prepare().await?;
                        Ok(())
                    },
                )
                .with_id(step_id(&name, TaskType::Prepare))
                .enabled(enabled)
            };

            let start = {
                let target = target.clone();
                TaskDefinition::unit(
                    TaskMeta::step(TaskType::Start, name.as_str()),
                    move |context: Arc<RunContext>| async move {
                        target.start().await?;
                        context.register_target(target.clone());
                        Ok(())
                    },
                )
                .with_id(step_id(&name, TaskType::Start))
            };

            let fetch = {
                let target = target.clone();
                let storybook = storybook.clone();
                let pass_with_no_stories = pipeline.options.pass_with_no_stories;
                TaskDefinition::unit(
                    TaskMeta::step(TaskType::FetchStories, name.as_str()),
                    move |_| async move {
                        let stories = target.storybook().await?;
                        if stories.is_empty() && !pass_with_no_stories {
                            return Err(RunnerError::Core(CoreError::NoStories));
                        }
                        *storybook.lock().unwrap() = Some(stories);
                        Ok(())
                    },
                )
                .with_id(step_id(&name, TaskType::FetchStories))
            };

            let tests = {
                let storybook = storybook.clone();
                let pipeline = pipeline.clone();
                let configurations = configurations.clone();
                let target_name = name.clone();
                TaskDefinition::nested(
                    TaskMeta::step(TaskType::Tests, name.as_str()),
                    move |_| {
                        let stories = storybook.lock().unwrap().take().unwrap_or_default();
                        let mut definitions = Vec::new();
                        for (configuration_name, configuration) in configurations.iter() {
                            for story in
                                filter_stories(&stories, &pipeline.options, configuration)?
                            {
                                definitions.push(story_test_task(
                                    &pipeline,
                                    &target_name,
                                    configuration_name,
                                    configuration,
                                    story,
                                ));
                            }
                        }
                        let mut options = RunnerOptions::default()
                            .with_concurrency(concurrency.div_ceil(batch_size))
                            .with_batch_size(batch_size)
                            .with_exit_on_error(false)
                            .with_batch_executor(story_batch_executor(
                                pipeline.target.clone(),
                                pipeline.differ.clone(),
                                pipeline.options.clone(),
                                pipeline.formatter.clone(),
                                pipeline.tolerance,
                                configurations.clone(),
                            ));
                        if let Some(builder) = batch_builder {
                            options = options.with_batch_builder(builder);
                        }
                        TaskRunner::new(definitions, options)
                    },
                )
                .with_id(step_id(&name, TaskType::Tests))
            };

            let stop = {
                let target = target.clone();
                TaskDefinition::unit(
                    TaskMeta::step(TaskType::Stop, name.as_str()),
                    move |context: Arc<RunContext>| async move {
                        target.stop().await?;
                        context.release_target(&target);
                        Ok(())
                    },
                )
                .with_id(step_id(&name, TaskType::Stop))
            };

            TaskRunner::new(
                vec![prepare, start, fetch, tests, stop],
                RunnerOptions::default(),
            )
        })
        .with_id(id)
    }
}

fn step_id(target_name: &str, task_type: TaskType) -> String {
    format!("{target_name}/{task_type}")
}

/// One screenshot test: capture the story, then compare the result.
fn story_test_task(
    pipeline: &StoryPipeline,
    target_name: &str,
    configuration_name: &str,
    configuration: &Configuration,
    story: Story,
) -> TaskDefinition<RunContext> {
    let id = format!(
        "{target_name}/{}/{configuration_name}/{}/{}",
        TaskType::Test,
        story.kind,
        story.story
    );
    let meta = TaskMeta::test(target_name, configuration_name, story.clone());
    let pipeline = pipeline.clone();
    let configuration = configuration.clone();
    let configuration_name = configuration_name.to_owned();
    TaskDefinition::unit(meta, move |_| async move {
        let screenshot = pipeline.capture(&story, &configuration).await?;
        compare_screenshot(
            screenshot,
            pipeline.differ.as_ref(),
            &pipeline.options,
            &pipeline.formatter,
            pipeline.tolerance,
            &configuration_name,
            &story,
        )
        .await?;
        Ok(())
    })
    .with_id(id)
}

/// Select the stories one configuration tests.
///
/// The run-wide patterns override the configuration's own; both kinds
/// match case-insensitively against `"{kind} {story}"`.
fn filter_stories(
    stories: &[Story],
    options: &TestOptions,
    configuration: &Configuration,
) -> Result<Vec<Story>, CoreError> {
    let exclude = options
        .skip_stories_pattern
        .as_deref()
        .or(configuration.skip_stories.as_deref())
        .map(compile_filter)
        .transpose()?;
    let include = options
        .stories_filter
        .as_deref()
        .or(configuration.stories_filter.as_deref())
        .map(compile_filter)
        .transpose()?;

    Ok(stories
        .iter()
        .filter(|story| {
            let full_name = story.full_name();
            let excluded = exclude
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(&full_name));
            let included = include
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(&full_name));
            !excluded && included
        })
        .cloned()
        .collect())
}

fn group_by_target(
    configurations: &BTreeMap<String, Configuration>,
) -> BTreeMap<String, BTreeMap<String, Configuration>> {
    let mut groups: BTreeMap<String, BTreeMap<String, Configuration>> = BTreeMap::new();
    for (name, configuration) in configurations {
        groups
            .entry(configuration.target.clone())
            .or_default()
            .insert(name.clone(), configuration.clone());
    }
    groups
}

/// Stop every target the aborted run left active, keeping stop failures
/// out of the run's own error.
async fn stop_active_targets(context: &RunContext) {
    let targets = context.take_active_targets();
    let results = join_all(targets.iter().map(|target| target.stop())).await;
    for error in results.into_iter().filter_map(Result::err) {
        warn!(error = %error, "Failed to stop target during cleanup");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::output_file;
    use async_trait::async_trait;
    use std::path::Path;
    use storycheck_core::CaptureOptions;
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeTarget {
        needs_prepare: bool,
        stories: Vec<Story>,
        fail_start: bool,
        fail_fetch: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTarget {
        fn with_stories(stories: Vec<Story>) -> Self {
            Self {
                stories,
                ..Self::default()
            }
        }

        fn log(&self, entry: impl Into<String>) {
            self.calls.lock().unwrap().push(entry.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Target for FakeTarget {
        fn needs_prepare(&self) -> bool {
            self.needs_prepare
        }
        async fn prepare(&self) -> Result<(), CoreError> {
            self.log("prepare");
            Ok(())
        }
        async fn start(&self) -> Result<(), CoreError> {
            self.log("start");
            if self.fail_start {
                return Err(CoreError::target("start refused"));
            }
            Ok(())
        }
        async fn stop(&self) -> Result<(), CoreError> {
            self.log("stop");
            Ok(())
        }
        async fn storybook(&self) -> Result<Vec<Story>, CoreError> {
            self.log("storybook");
            if self.fail_fetch {
                return Err(CoreError::target("catalog unavailable"));
            }
            Ok(self.stories.clone())
        }
        async fn capture_screenshot_for_story(
            &self,
            story: &Story,
            _options: &CaptureOptions,
            _configuration: &Configuration,
        ) -> Result<Option<Vec<u8>>, CoreError> {
            self.log(format!("capture {}", story.full_name()));
            Ok(Some(format!("shot of {}", story.full_name()).into_bytes()))
        }
    }

    struct VerdictDiffer(bool);

    #[async_trait]
    impl ImageDiffer for VerdictDiffer {
        async fn images_match(
            &self,
            _reference: &Path,
            _candidate: &Path,
            diff: &Path,
            _tolerance: f64,
        ) -> Result<bool, CoreError> {
            if !self.0 {
                output_file(diff, b"diff").await?;
            }
            Ok(self.0)
        }
    }

    fn stories() -> Vec<Story> {
        vec![
            Story::new("button--primary", "Button", "primary"),
            Story::new("button--secondary", "Button", "secondary"),
        ]
    }

    // Serial captures keep the call logs deterministic.
    fn options_in(dir: &Path) -> TestOptions {
        TestOptions {
            output_dir: dir.join("current"),
            reference_dir: dir.join("reference"),
            difference_dir: dir.join("difference"),
            concurrency: 1,
            silent: true,
            ..TestOptions::default()
        }
    }

    fn suite_with(options: TestOptions, target: Arc<FakeTarget>, matches: bool) -> TestSuite {
        let mut suite = TestSuite::new(options, Arc::new(VerdictDiffer(matches)));
        suite.register_target("chrome.app", TargetSetup::new(target));
        suite
    }

    fn laptop_configurations() -> BTreeMap<String, Configuration> {
        BTreeMap::from([("laptop".to_owned(), Configuration::for_target("chrome.app"))])
    }

    #[tokio::test]
    async fn test_lifecycle_runs_in_order_and_updates_references() {
        let dir = tempdir().unwrap();
        let options = TestOptions {
            update_reference: true,
            ..options_in(dir.path())
        };
        let target = Arc::new(FakeTarget {
            needs_prepare: true,
            ..FakeTarget::with_stories(stories())
        });
        let suite = suite_with(options.clone(), target.clone(), true);

        suite.run(&laptop_configurations()).await.unwrap();

        assert_eq!(
            target.calls(),
            vec![
                "prepare",
                "start",
                "storybook",
                "capture Button primary",
                "capture Button secondary",
                "stop",
            ]
        );
        assert_eq!(
            std::fs::read(options.reference_dir.join("laptop Button primary.png")).unwrap(),
            b"shot of Button primary"
        );
        assert!(options.reference_dir.join("laptop Button secondary.png").exists());
    }

    #[tokio::test]
    async fn test_prepare_skipped_when_target_does_not_need_it() {
        let dir = tempdir().unwrap();
        let options = TestOptions {
            update_reference: true,
            ..options_in(dir.path())
        };
        let target = Arc::new(FakeTarget::with_stories(stories()));
        let suite = suite_with(options, target.clone(), true);

        suite.run(&laptop_configurations()).await.unwrap();

        assert_eq!(target.calls().first().map(String::as_str), Some("start"));
    }

    #[tokio::test]
    async fn test_mismatch_is_reported_as_visual_failure() {
        let dir = tempdir().unwrap();
        let options = options_in(dir.path());
        for name in ["laptop Button primary.png", "laptop Button secondary.png"] {
            output_file(&options.reference_dir.join(name), b"accepted")
                .await
                .unwrap();
        }
        let target = Arc::new(FakeTarget::with_stories(stories()));
        let suite = suite_with(options, target.clone(), false);

        let error = suite.run(&laptop_configurations()).await.unwrap_err();

        let RunnerError::Aggregate(aggregate) = error else {
            panic!("expected aggregate, got {error:?}");
        };
        assert_eq!(aggregate.errors.len(), 2);
        assert!(aggregate.all_snapshot_failures());
        // Fail-fast skipped the stop task; the driver's cleanup stopped
        // the target exactly once.
        let stops = target.calls().iter().filter(|call| *call == "stop").count();
        assert_eq!(stops, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_infrastructure_and_target_is_stopped() {
        let dir = tempdir().unwrap();
        let target = Arc::new(FakeTarget {
            fail_fetch: true,
            ..FakeTarget::default()
        });
        let suite = suite_with(options_in(dir.path()), target.clone(), true);

        let error = suite.run(&laptop_configurations()).await.unwrap_err();

        let RunnerError::Aggregate(aggregate) = error else {
            panic!("expected aggregate, got {error:?}");
        };
        assert!(!aggregate.all_snapshot_failures());
        assert_eq!(target.calls(), vec!["start", "storybook", "stop"]);
    }

    #[tokio::test]
    async fn test_failed_start_leaves_nothing_to_clean_up() {
        let dir = tempdir().unwrap();
        let target = Arc::new(FakeTarget {
            fail_start: true,
            ..FakeTarget::default()
        });
        let suite = suite_with(options_in(dir.path()), target.clone(), true);

        let error = suite.run(&laptop_configurations()).await.unwrap_err();

        assert!(matches!(error, RunnerError::Aggregate(_)));
        assert_eq!(target.calls(), vec!["start"]);
    }

    #[tokio::test]
    async fn test_empty_storybook_fails_with_no_stories() {
        let dir = tempdir().unwrap();
        let target = Arc::new(FakeTarget::default());
        let suite = suite_with(options_in(dir.path()), target.clone(), true);

        let error = suite.run(&laptop_configurations()).await.unwrap_err();

        let RunnerError::Aggregate(aggregate) = error else {
            panic!("expected aggregate, got {error:?}");
        };
        assert_eq!(aggregate.errors, vec![RunnerError::Core(CoreError::NoStories)]);
    }

    #[tokio::test]
    async fn test_empty_storybook_passes_when_allowed() {
        let dir = tempdir().unwrap();
        let options = TestOptions {
            pass_with_no_stories: true,
            ..options_in(dir.path())
        };
        let target = Arc::new(FakeTarget::default());
        let suite = suite_with(options, target.clone(), true);

        suite.run(&laptop_configurations()).await.unwrap();

        assert_eq!(target.calls(), vec!["start", "storybook", "stop"]);
    }

    #[tokio::test]
    async fn test_unknown_target_fails_before_running_anything() {
        let dir = tempdir().unwrap();
        let target = Arc::new(FakeTarget::default());
        let suite = suite_with(options_in(dir.path()), target.clone(), true);
        let configurations =
            BTreeMap::from([("ios".to_owned(), Configuration::for_target("native.ios"))]);

        let error = suite.run(&configurations).await.unwrap_err();

        assert_eq!(
            error,
            RunnerError::Core(CoreError::target("unknown target \"native.ios\""))
        );
        assert!(target.calls().is_empty());
    }

    #[tokio::test]
    async fn test_configuration_story_filters_select_captures() {
        let dir = tempdir().unwrap();
        let options = TestOptions {
            update_reference: true,
            ..options_in(dir.path())
        };
        let target = Arc::new(FakeTarget::with_stories(vec![
            Story::new("button--primary", "Button", "primary"),
            Story::new("button--secondary", "Button", "secondary"),
            Story::new("card--default", "Card", "default"),
        ]));
        let suite = suite_with(options, target.clone(), true);
        let mut configuration = Configuration::for_target("chrome.app");
        configuration.skip_stories = Some("secondary".to_owned());
        configuration.stories_filter = Some("^button".to_owned());
        let configurations = BTreeMap::from([("laptop".to_owned(), configuration)]);

        suite.run(&configurations).await.unwrap();

        let captures: Vec<String> = target
            .calls()
            .into_iter()
            .filter(|call| call.starts_with("capture"))
            .collect();
        assert_eq!(captures, vec!["capture Button primary"]);
    }

    #[tokio::test]
    async fn test_global_skip_pattern_overrides_configuration() {
        let dir = tempdir().unwrap();
        let options = TestOptions {
            update_reference: true,
            skip_stories_pattern: Some("primary".to_owned()),
            ..options_in(dir.path())
        };
        let target = Arc::new(FakeTarget::with_stories(stories()));
        let suite = suite_with(options, target.clone(), true);
        let mut configuration = Configuration::for_target("chrome.app");
        configuration.skip_stories = Some("secondary".to_owned());
        let configurations = BTreeMap::from([("laptop".to_owned(), configuration)]);

        suite.run(&configurations).await.unwrap();

        let captures: Vec<String> = target
            .calls()
            .into_iter()
            .filter(|call| call.starts_with("capture"))
            .collect();
        assert_eq!(captures, vec!["capture Button secondary"]);
    }

    #[tokio::test]
    async fn test_invalid_story_filter_fails_the_tests_task() {
        let dir = tempdir().unwrap();
        let target = Arc::new(FakeTarget::with_stories(stories()));
        let suite = suite_with(options_in(dir.path()), target.clone(), true);
        let mut configuration = Configuration::for_target("chrome.app");
        configuration.skip_stories = Some("(".to_owned());
        let configurations = BTreeMap::from([("laptop".to_owned(), configuration)]);

        let error = suite.run(&configurations).await.unwrap_err();

        let RunnerError::Aggregate(aggregate) = error else {
            panic!("expected aggregate, got {error:?}");
        };
        assert_eq!(aggregate.errors.len(), 1);
        assert!(matches!(
            aggregate.errors[0],
            RunnerError::Core(CoreError::InvalidFilter { .. })
        ));
        assert!(!aggregate.all_snapshot_failures());
    }

    #[tokio::test]
    async fn test_run_empties_work_directories_and_places_gitignore() {
        let dir = tempdir().unwrap();
        let options = options_in(dir.path());
        output_file(&options.output_dir.join("stale.png"), b"old")
            .await
            .unwrap();
        for name in ["laptop Button primary.png", "laptop Button secondary.png"] {
            output_file(&options.reference_dir.join(name), b"accepted")
                .await
                .unwrap();
        }
        let target = Arc::new(FakeTarget::with_stories(stories()));
        let suite = suite_with(options.clone(), target, true);

        suite.run(&laptop_configurations()).await.unwrap();

        assert!(!options.output_dir.join("stale.png").exists());
        let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(gitignore, "current\ndifference\n");
    }

    #[tokio::test]
    async fn test_no_matching_configurations_is_a_pass() {
        let dir = tempdir().unwrap();
        let options = TestOptions {
            configuration_filter: Some("nothing-matches-this".to_owned()),
            ..options_in(dir.path())
        };
        let target = Arc::new(FakeTarget::with_stories(stories()));
        let suite = suite_with(options, target.clone(), true);

        suite.run(&laptop_configurations()).await.unwrap();

        assert!(target.calls().is_empty());
    }

    #[test]
    fn test_group_by_target_keeps_configuration_names() {
        let configurations = BTreeMap::from([
            ("laptop".to_owned(), Configuration::for_target("chrome.app")),
            ("a11y".to_owned(), Configuration::for_target("chrome.app")),
            ("ios".to_owned(), Configuration::for_target("native.ios")),
        ]);

        let groups = group_by_target(&configurations);

        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups["chrome.app"].keys().collect::<Vec<_>>(),
            vec!["a11y", "laptop"]
        );
        assert_eq!(groups["native.ios"].keys().collect::<Vec<_>>(), vec!["ios"]);
    }

    #[test]
    fn test_filter_stories_matches_case_insensitively() {
        let stories = vec![
            Story::new("button--primary", "Button", "primary"),
            Story::new("card--default", "Card", "default"),
        ];
        let mut configuration = Configuration::for_target("chrome.app");
        configuration.stories_filter = Some("BUTTON".to_owned());

        let selected =
            filter_stories(&stories, &TestOptions::default(), &configuration).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].kind, "Button");
    }
}
