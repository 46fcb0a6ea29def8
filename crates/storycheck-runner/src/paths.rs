//! Output path construction for screenshot artifacts.

use crate::config::TestOptions;
use std::path::PathBuf;
use std::sync::Arc;
use storycheck_core::Story;

/// Builds the base file name (without extension) for one screenshot.
pub type FileNameFormatter = Arc<dyn Fn(&str, &Story) -> String + Send + Sync>;

/// Default naming: `"{configuration} {kind} {story}"`.
pub fn default_file_name(configuration_name: &str, story: &Story) -> String {
    format!("{configuration_name} {} {}", story.kind, story.story)
}

/// Where one story's screenshot artifacts live.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    /// Freshly captured screenshot.
    pub candidate: PathBuf,
    /// Accepted reference image.
    pub reference: PathBuf,
    /// Visual diff written on mismatch.
    pub diff: PathBuf,
}

/// Resolve the artifact paths for one story under one configuration.
pub fn output_paths(
    options: &TestOptions,
    formatter: &FileNameFormatter,
    configuration_name: &str,
    story: &Story,
) -> OutputPaths {
    let file_name = format!("{}.png", formatter(configuration_name, story));
    OutputPaths {
        candidate: options.output_dir.join(&file_name),
        reference: options.reference_dir.join(&file_name),
        diff: options.difference_dir.join(&file_name),
    }
}
