//! Storycheck Runner
//!
//! The engine behind a visual test run: a hierarchical concurrent task
//! runner with pluggable batch strategies, the screenshot pipeline
//! (capture decorators, comparison, file layout), and the [`TestSuite`]
//! driver that turns configurations and registered targets into task
//! trees. Also home to the approve flow that promotes captured images
//! to references.

pub mod approve;
pub mod batch;
pub mod compare;
pub mod concurrent;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod failure;
pub mod fs;
pub mod paths;
pub mod render;
pub mod suite;
pub mod task;
pub mod task_runner;

// Re-export commonly used types
pub use approve::approve_images;
pub use batch::story_batch_executor;
pub use compare::compare_screenshot;
pub use concurrent::each_of_limit;
pub use config::{filter_configurations, TestOptions};
pub use context::RunContext;
pub use error::{RunnerError, TaskRunnerError};
pub use events::{RunnerEvent, Subscription};
pub use failure::{with_retries, with_timeout};
pub use paths::{default_file_name, output_paths, FileNameFormatter, OutputPaths};
pub use render::{attach_progress_logger, render_task};
pub use suite::{TargetSetup, TestSuite};
pub use task::{Execution, ScheduledTask, TaskDefinition, TaskWork};
pub use task_runner::{
    chunk_batches, default_batch_execute, BatchBuilder, BatchExecutor, RunnerOptions,
    TaskRunner, TaskSnapshot,
};
