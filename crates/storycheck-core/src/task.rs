//! Task identity and metadata carried through runners and their events.

use crate::Story;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What phase of a test run a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Top-level task grouping everything for one target.
    Target,
    /// One-time target setup (only present when the target needs it).
    Prepare,
    /// Bring the target up.
    Start,
    /// Fetch the story catalog from the target.
    FetchStories,
    /// Group of all screenshot tests for one target.
    Tests,
    /// One screenshot test for one story under one configuration.
    Test,
    /// Bring the target down.
    Stop,
}

impl TaskType {
    /// Wire name of the task type, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Target => "TARGET",
            Self::Prepare => "PREPARE",
            Self::Start => "START",
            Self::FetchStories => "FETCH_STORIES",
            Self::Tests => "TESTS",
            Self::Test => "TEST",
            Self::Stop => "STOP",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of a task within one runner.
///
/// Tasks with an explicit id keep it; the rest are identified by their
/// zero-based position in the runner's filtered task list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    /// Explicitly assigned name.
    Named(String),
    /// Position in the filtered task list.
    Index(usize),
}

impl TaskId {
    /// Returns the explicit name, if this id has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for TaskId {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<String> for TaskId {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<usize> for TaskId {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Descriptive metadata attached to every task.
///
/// Observers render progress from it, and batch executors reconstruct
/// bulk requests from it, so test tasks carry their full `Story`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    /// Phase this task belongs to.
    #[serde(rename = "type")]
    pub task_type: TaskType,

    /// Target name, when the task is tied to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Configuration name, for test tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,

    /// Story under test, for test tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<Story>,
}

impl TaskMeta {
    /// Metadata for the top-level task of one target.
    pub fn target(target: impl Into<String>) -> Self {
        Self {
            task_type: TaskType::Target,
            target: Some(target.into()),
            configuration: None,
            story: None,
        }
    }

    /// Metadata for a lifecycle step (prepare/start/fetch/tests/stop) of one target.
    pub fn step(task_type: TaskType, target: impl Into<String>) -> Self {
        Self {
            task_type,
            target: Some(target.into()),
            configuration: None,
            story: None,
        }
    }

    /// Metadata for a single screenshot test.
    pub fn test(
        target: impl Into<String>,
        configuration: impl Into<String>,
        story: Story,
    ) -> Self {
        Self {
            task_type: TaskType::Test,
            target: Some(target.into()),
            configuration: Some(configuration.into()),
            story: Some(story),
        }
    }

    /// Human-readable task description used by progress observers.
    ///
    /// Test tasks render as `target/configuration/kind/story`; everything
    /// else falls back to the task id.
    pub fn describe(&self, id: &TaskId) -> String {
        match (&self.task_type, &self.target, &self.configuration, &self.story) {
            (TaskType::Test, Some(target), Some(configuration), Some(story)) => {
                format!("{target}/{configuration}/{}/{}", story.kind, story.story)
            }
            _ => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId::from("chrome.app").to_string(), "chrome.app");
        assert_eq!(TaskId::from(3usize).to_string(), "3");
    }

    #[test]
    fn test_test_meta_description() {
        let meta = TaskMeta::test(
            "chrome.app",
            "desktop",
            Story::new("button--primary", "Button", "primary"),
        );
        let id = TaskId::from("whatever");
        assert_eq!(meta.describe(&id), "chrome.app/desktop/Button/primary");
    }

    #[test]
    fn test_step_meta_description_falls_back_to_id() {
        let meta = TaskMeta::step(TaskType::Start, "chrome.app");
        assert_eq!(meta.describe(&TaskId::from("chrome.app: start")), "chrome.app: start");
        assert_eq!(meta.describe(&TaskId::from(1usize)), "1");
    }

    #[test]
    fn test_meta_serde_type_field() {
        let meta = TaskMeta::step(TaskType::FetchStories, "chrome.app");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "FETCH_STORIES");
        assert_eq!(json["target"], "chrome.app");
    }
}
