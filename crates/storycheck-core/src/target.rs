//! The capture capability boundary.
//!
//! A target owns a rendering environment (a browser, a simulator, a
//! device farm) and knows how to produce screenshots from it. The runner
//! never sees how rendering works; it speaks to targets exclusively
//! through this trait and treats screenshots as opaque bytes.

use crate::{CaptureOptions, Configuration, CoreError, Story};
use async_trait::async_trait;

/// One story capture inside a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryRequest {
    /// Story to render.
    pub story: Story,
    /// Name of the configuration being captured.
    pub configuration_name: String,
    /// The configuration's target settings.
    pub configuration: Configuration,
}

/// A screenshot-producing environment.
///
/// Lifecycle calls arrive in order: optionally `prepare`, then `start`,
/// then any number of catalog/capture calls, then `stop`. `stop` may
/// also be called out of band when a run is torn down after a failure,
/// so it must tolerate a partially started target.
#[async_trait]
pub trait Target: Send + Sync {
    /// Whether this target wants a `prepare` call before `start`.
    fn needs_prepare(&self) -> bool {
        false
    }

    /// One-time setup (downloads, build steps) before the target starts.
    async fn prepare(&self) -> Result<(), CoreError> {
        Ok(())
    }

    /// Bring the rendering environment up.
    async fn start(&self) -> Result<(), CoreError>;

    /// Tear the rendering environment down and release its resources.
    async fn stop(&self) -> Result<(), CoreError>;

    /// Fetch the story catalog.
    async fn storybook(&self) -> Result<Vec<Story>, CoreError>;

    /// Capture one story under one configuration.
    ///
    /// `Ok(None)` means the capture ran but produced nothing; the caller
    /// reports it as a capture failure for the story.
    async fn capture_screenshot_for_story(
        &self,
        story: &Story,
        options: &CaptureOptions,
        configuration: &Configuration,
    ) -> Result<Option<Vec<u8>>, CoreError>;

    /// Whether this target can capture many stories in one call.
    fn supports_batch_capture(&self) -> bool {
        false
    }

    /// Capture every requested story in one bulk call.
    ///
    /// The reply must hold one slot per request, in request order; a
    /// slot-level `Err` fails only that story, while an outer `Err`
    /// fails the whole batch.
    async fn capture_screenshots_for_stories(
        &self,
        requests: &[StoryRequest],
        options: &CaptureOptions,
    ) -> Result<Vec<Result<Vec<u8>, CoreError>>, CoreError> {
        let _ = (requests, options);
        Err(CoreError::target("batch capture is not supported by this target"))
    }
}
