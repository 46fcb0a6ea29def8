//! The config file and command line surface of the test commands.
//!
//! Run settings come from three layers: built-in defaults, the JSON
//! config file, and command line flags, with later layers winning.

use clap::Args;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use storycheck_core::{CaptureOptions, Configuration};
use storycheck_runner::TestOptions;

/// On-disk run settings, usually `storycheck.config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    /// Capture configurations by name.
    #[serde(default)]
    pub configurations: BTreeMap<String, Configuration>,
    /// Where fresh captures are written.
    pub output: Option<PathBuf>,
    /// Where accepted reference images live.
    pub reference: Option<PathBuf>,
    /// Where visual diffs are written on mismatch.
    pub difference: Option<PathBuf>,
    /// Default per-target capture concurrency.
    pub concurrency: Option<usize>,
    /// Diff tolerance handed to the image differ.
    pub tolerance: Option<f64>,
    /// Per-capture timeout in milliseconds.
    pub capture_timeout: Option<u64>,
    /// Extra capture attempts after the first failure.
    pub capture_retries: Option<u32>,
    /// Pause between capture attempts in milliseconds.
    pub capture_backoff: Option<u64>,
    /// Global story exclusion pattern.
    pub skip_stories: Option<String>,
    /// Global story inclusion pattern.
    pub stories_filter: Option<String>,
    /// Fail stories that have no reference instead of accepting them.
    pub require_reference: Option<bool>,
    /// Treat an empty story catalog as success.
    pub pass_with_no_stories: Option<bool>,
    /// Approve only stories that produced a diff.
    pub diff_only: Option<bool>,
    /// Log every status transition, not just terminal ones.
    pub verbose: Option<bool>,
}

impl FileConfig {
    /// Load and parse the config file.
    pub async fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
        Ok(config)
    }
}

/// Flags shared by the test and update commands.
#[derive(Args, Clone, Debug, Default)]
pub struct TestArgs {
    /// Only test configurations whose target matches this pattern
    #[arg(long, value_name = "PATTERN")]
    pub target_filter: Option<String>,

    /// Only test configurations whose name matches this pattern
    #[arg(long, value_name = "PATTERN")]
    pub configuration_filter: Option<String>,

    /// Only test stories matching this pattern
    #[arg(long, value_name = "PATTERN")]
    pub stories_filter: Option<String>,

    /// Skip stories matching this pattern
    #[arg(long, value_name = "PATTERN")]
    pub skip_stories: Option<String>,

    /// Where fresh captures are written
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Where accepted reference images live
    #[arg(long, value_name = "DIR")]
    pub reference: Option<PathBuf>,

    /// Where visual diffs are written on mismatch
    #[arg(long, value_name = "DIR")]
    pub difference: Option<PathBuf>,

    /// Per-target capture concurrency
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Diff tolerance handed to the image differ
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Per-capture timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub capture_timeout: Option<u64>,

    /// Extra capture attempts after the first failure
    #[arg(long)]
    pub capture_retries: Option<u32>,

    /// Pause between capture attempts in milliseconds
    #[arg(long, value_name = "MS")]
    pub capture_backoff: Option<u64>,

    /// Fail stories that have no reference instead of accepting them
    #[arg(long)]
    pub require_reference: bool,

    /// Treat an empty story catalog as success
    #[arg(long)]
    pub pass_with_no_stories: bool,

    /// Suppress progress output
    #[arg(long)]
    pub silent: bool,

    /// Log every status transition, not just terminal ones
    #[arg(long)]
    pub verbose: bool,
}

/// Resolve the effective options for one run: flags beat the config
/// file, the config file beats the defaults.
pub fn resolve_options(
    config: &FileConfig,
    args: &TestArgs,
    update_reference: bool,
) -> TestOptions {
    let defaults = TestOptions::default();

    let mut capture = CaptureOptions::default();
    if let Some(timeout) = args.capture_timeout.or(config.capture_timeout) {
        capture = capture.with_timeout(Duration::from_millis(timeout));
    }
    if let Some(retries) = args.capture_retries.or(config.capture_retries) {
        capture = capture.with_retries(retries);
    }
    if let Some(backoff) = args.capture_backoff.or(config.capture_backoff) {
        capture = capture.with_backoff(Duration::from_millis(backoff));
    }

    TestOptions {
        output_dir: args
            .output
            .clone()
            .or_else(|| config.output.clone())
            .unwrap_or(defaults.output_dir),
        reference_dir: args
            .reference
            .clone()
            .or_else(|| config.reference.clone())
            .unwrap_or(defaults.reference_dir),
        difference_dir: args
            .difference
            .clone()
            .or_else(|| config.difference.clone())
            .unwrap_or(defaults.difference_dir),
        capture,
        tolerance: args.tolerance.or(config.tolerance).unwrap_or(defaults.tolerance),
        concurrency: args
            .concurrency
            .or(config.concurrency)
            .unwrap_or(defaults.concurrency),
        update_reference,
        require_reference: args.require_reference || config.require_reference.unwrap_or(false),
        pass_with_no_stories: args.pass_with_no_stories
            || config.pass_with_no_stories.unwrap_or(false),
        skip_stories_pattern: args
            .skip_stories
            .clone()
            .or_else(|| config.skip_stories.clone()),
        stories_filter: args
            .stories_filter
            .clone()
            .or_else(|| config.stories_filter.clone()),
        target_filter: args.target_filter.clone(),
        configuration_filter: args.configuration_filter.clone(),
        silent: args.silent,
        verbose: args.verbose || config.verbose.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_config_file_parses_camel_case_keys() {
        let config = parse(
            r#"{
                "configurations": {
                    "chrome.laptop": {"target": "chrome.app", "width": 1366}
                },
                "reference": "./screenshots",
                "captureTimeout": 30000,
                "skipStories": "loading",
                "passWithNoStories": true
            }"#,
        );

        assert_eq!(config.configurations["chrome.laptop"].target, "chrome.app");
        assert_eq!(config.reference, Some(PathBuf::from("./screenshots")));
        assert_eq!(config.capture_timeout, Some(30_000));
        assert_eq!(config.skip_stories.as_deref(), Some("loading"));
        assert_eq!(config.pass_with_no_stories, Some(true));
    }

    #[test]
    fn test_empty_config_resolves_to_defaults() {
        let options = resolve_options(&FileConfig::default(), &TestArgs::default(), false);
        assert_eq!(options, TestOptions::default());
    }

    #[test]
    fn test_config_file_values_beat_defaults() {
        let config = parse(
            r#"{
                "output": "shots/current",
                "concurrency": 8,
                "tolerance": 0.5,
                "captureRetries": 2,
                "verbose": true
            }"#,
        );

        let options = resolve_options(&config, &TestArgs::default(), false);

        assert_eq!(options.output_dir, PathBuf::from("shots/current"));
        assert_eq!(options.concurrency, 8);
        assert_eq!(options.tolerance, 0.5);
        assert_eq!(options.capture.retries, 2);
        assert!(options.verbose);
    }

    #[test]
    fn test_flags_beat_the_config_file() {
        let config = parse(r#"{"concurrency": 8, "storiesFilter": "button"}"#);
        let args = TestArgs {
            concurrency: Some(2),
            stories_filter: Some("card".to_owned()),
            capture_timeout: Some(5_000),
            ..TestArgs::default()
        };

        let options = resolve_options(&config, &args, true);

        assert_eq!(options.concurrency, 2);
        assert_eq!(options.stories_filter.as_deref(), Some("card"));
        assert_eq!(options.capture.timeout, Duration::from_millis(5_000));
        assert!(options.update_reference);
    }

    #[tokio::test]
    async fn test_load_reports_the_failing_path() {
        let error = FileConfig::load(Path::new("/no/such/storycheck.config.json"))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("/no/such/storycheck.config.json"));
    }
}
