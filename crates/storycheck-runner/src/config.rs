//! Test run options and configuration selection.

use regex::RegexBuilder;
use std::collections::BTreeMap;
use std::path::PathBuf;
use storycheck_core::{CaptureOptions, Configuration, CoreError};

/// Options for one test run.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOptions {
    /// Where fresh captures are written.
    pub output_dir: PathBuf,
    /// Where accepted reference images live.
    pub reference_dir: PathBuf,
    /// Where visual diffs are written on mismatch.
    pub difference_dir: PathBuf,
    /// Per-capture timeout/retry knobs.
    pub capture: CaptureOptions,
    /// Diff tolerance handed to the image differ.
    pub tolerance: f64,
    /// Default per-target capture concurrency.
    pub concurrency: usize,
    /// Write references instead of comparing against them.
    pub update_reference: bool,
    /// Fail stories that have no reference instead of auto-accepting.
    pub require_reference: bool,
    /// Treat an empty story catalog as success.
    pub pass_with_no_stories: bool,
    /// Global story exclusion pattern, overriding per-configuration ones.
    pub skip_stories_pattern: Option<String>,
    /// Global story inclusion pattern, overriding per-configuration ones.
    pub stories_filter: Option<String>,
    /// Only test configurations whose target matches this pattern.
    pub target_filter: Option<String>,
    /// Only test configurations whose name matches this pattern.
    pub configuration_filter: Option<String>,
    /// Suppress progress output.
    pub silent: bool,
    /// Log every status transition, not just terminal ones.
    pub verbose: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(".storycheck/current"),
            reference_dir: PathBuf::from(".storycheck/reference"),
            difference_dir: PathBuf::from(".storycheck/difference"),
            capture: CaptureOptions::default(),
            tolerance: 2.5,
            concurrency: 4,
            update_reference: false,
            require_reference: false,
            pass_with_no_stories: false,
            skip_stories_pattern: None,
            stories_filter: None,
            target_filter: None,
            configuration_filter: None,
            silent: false,
            verbose: false,
        }
    }
}

/// Compile a case-insensitive filter pattern.
pub(crate) fn compile_filter(pattern: &str) -> Result<regex::Regex, CoreError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| CoreError::InvalidFilter {
            pattern: pattern.to_owned(),
            message: err.to_string(),
        })
}

/// Select the configurations a run should test.
///
/// `target_filter` matches against each configuration's target name,
/// `configuration_filter` against the configuration name itself; both
/// are case-insensitive. Absent filters select everything.
pub fn filter_configurations(
    configurations: &BTreeMap<String, Configuration>,
    target_filter: Option<&str>,
    configuration_filter: Option<&str>,
) -> Result<BTreeMap<String, Configuration>, CoreError> {
    let target_pattern = target_filter.map(compile_filter).transpose()?;
    let name_pattern = configuration_filter.map(compile_filter).transpose()?;

    Ok(configurations
        .iter()
        .filter(|(name, configuration)| {
            let target_matches = target_pattern
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(&configuration.target));
            let name_matches = name_pattern
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(name));
            target_matches && name_matches
        })
        .map(|(name, configuration)| (name.clone(), configuration.clone()))
        .collect())
}
