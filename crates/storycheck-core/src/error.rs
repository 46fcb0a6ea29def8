//! Domain errors.
//!
//! Variants are `Clone + PartialEq` so they can travel inside task state
//! snapshots and be compared in tests; foreign causes are stringified at
//! the boundary instead of boxed.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by targets, the comparison pipeline, and the helpers
/// around them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The target produced no screenshot for a story.
    #[error("failed to capture screenshot for \"{story}\"")]
    CaptureFailed {
        /// `"{kind} {story}"` of the affected story.
        story: String,
    },

    /// No reference image exists and references are required.
    #[error("no reference image found for \"{story}\"")]
    MissingReference {
        /// `"{kind} {story}"` of the affected story.
        story: String,
    },

    /// The captured screenshot differs from the reference image.
    #[error("screenshot for \"{story}\" differs from reference, see {}", diff_path.display())]
    Mismatch {
        /// `"{kind} {story}"` of the affected story.
        story: String,
        /// Where the visual diff was written.
        diff_path: PathBuf,
    },

    /// The target's story catalog came back empty.
    #[error("no stories were found")]
    NoStories,

    /// An operation exceeded its deadline.
    #[error("{operation} timed out after {}ms", timeout.as_millis())]
    Timeout {
        /// What was being attempted.
        operation: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// All attempts of a retried operation failed.
    #[error("{operation} failed after {attempts} attempts")]
    RetriesExhausted {
        /// What was being attempted.
        operation: String,
        /// Total attempts made, including the first.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: Box<CoreError>,
    },

    /// A story filter pattern failed to compile.
    #[error("invalid story filter pattern \"{pattern}\": {message}")]
    InvalidFilter {
        /// The offending pattern.
        pattern: String,
        /// Compiler diagnostic.
        message: String,
    },

    /// Failure reported by a target implementation.
    #[error("target error: {0}")]
    Target(String),

    /// Filesystem failure, stringified.
    #[error("i/o error: {0}")]
    Io(String),

    /// The approve flow found no images to promote.
    #[error("no images found to approve")]
    NothingToApprove,
}

impl CoreError {
    /// Shorthand for [`CoreError::Target`].
    pub fn target(message: impl Into<String>) -> Self {
        Self::Target(message.into())
    }

    /// Follows `RetriesExhausted` source links down to the error of the
    /// final attempt.
    pub fn root_cause(&self) -> &CoreError {
        let mut current = self;
        while let CoreError::RetriesExhausted { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns true if this failure means "the screenshot is wrong"
    /// rather than "the run is broken": a mismatch, a missing reference,
    /// or a capture that produced nothing. Sees through retry wrapping.
    pub fn is_snapshot_failure(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::CaptureFailed { .. } | Self::MissingReference { .. } | Self::Mismatch { .. }
        )
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_failure_variants() {
        assert!(CoreError::CaptureFailed { story: "Button primary".into() }
            .is_snapshot_failure());
        assert!(CoreError::MissingReference { story: "Button primary".into() }
            .is_snapshot_failure());
        assert!(CoreError::Mismatch {
            story: "Button primary".into(),
            diff_path: PathBuf::from("diff.png"),
        }
        .is_snapshot_failure());
        assert!(!CoreError::NoStories.is_snapshot_failure());
        assert!(!CoreError::Target("boom".into()).is_snapshot_failure());
    }

    #[test]
    fn test_root_cause_unwraps_nested_retries() {
        let inner = CoreError::Mismatch {
            story: "Button primary".into(),
            diff_path: PathBuf::from("diff.png"),
        };
        let wrapped = CoreError::RetriesExhausted {
            operation: "screenshot capture".into(),
            attempts: 2,
            source: Box::new(CoreError::RetriesExhausted {
                operation: "screenshot capture".into(),
                attempts: 2,
                source: Box::new(inner.clone()),
            }),
        };
        assert_eq!(wrapped.root_cause(), &inner);
        assert!(wrapped.is_snapshot_failure());
    }

    #[test]
    fn test_timeout_message_in_millis() {
        let err = CoreError::Timeout {
            operation: "screenshot capture".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "screenshot capture timed out after 30000ms");
    }

    #[test]
    fn test_io_errors_are_stringified() {
        let err: CoreError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err, CoreError::Io("missing".into()));
    }
}
