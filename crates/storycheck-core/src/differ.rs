//! The image comparison boundary.

use crate::CoreError;
use async_trait::async_trait;
use std::path::Path;

/// Pixel comparison engine.
///
/// Implementations compare two images on disk and, when they differ
/// beyond `tolerance`, write a visual diff to `diff` before returning
/// `Ok(false)`. What "tolerance" means (percent, distance, SSIM) is up
/// to the engine.
#[async_trait]
pub trait ImageDiffer: Send + Sync {
    /// Compare `candidate` against `reference`.
    async fn images_match(
        &self,
        reference: &Path,
        candidate: &Path,
        diff: &Path,
        tolerance: f64,
    ) -> Result<bool, CoreError>;
}
