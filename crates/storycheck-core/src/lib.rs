//! Storycheck Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Async runtime specifics
//! - Filesystem/network IO
//! - Any concrete browser or diff engine
//!
//! It defines the vocabulary the runner and targets share: task
//! status/identity/metadata, stories and configurations, capture
//! options, the domain error enum, and the `Target`/`ImageDiffer`
//! capability traits.

pub mod config;
pub mod differ;
pub mod error;
pub mod options;
pub mod status;
pub mod story;
pub mod target;
pub mod task;

// Re-export commonly used types
pub use config::Configuration;
pub use differ::ImageDiffer;
pub use error::CoreError;
pub use options::CaptureOptions;
pub use status::TaskStatus;
pub use story::Story;
pub use target::{StoryRequest, Target};
pub use task::{TaskId, TaskMeta, TaskType};
