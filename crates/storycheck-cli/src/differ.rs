//! The built-in image comparison engine.

use async_trait::async_trait;
use std::path::Path;
use storycheck_core::{CoreError, ImageDiffer};
use storycheck_runner::fs::output_file;

/// Byte-for-byte image comparison.
///
/// Deterministic render pipelines produce identical files for identical
/// output, so exact equality is the strictest check and needs no image
/// decoding; the tolerance is ignored. On mismatch the candidate bytes
/// are written to the diff path so the difference directory holds one
/// artifact per failed story.
pub struct ExactDiffer;

#[async_trait]
impl ImageDiffer for ExactDiffer {
    async fn images_match(
        &self,
        reference: &Path,
        candidate: &Path,
        diff: &Path,
        _tolerance: f64,
    ) -> Result<bool, CoreError> {
        let reference_bytes = tokio::fs::read(reference).await?;
        let candidate_bytes = tokio::fs::read(candidate).await?;
        if reference_bytes == candidate_bytes {
            return Ok(true);
        }
        output_file(diff, &candidate_bytes).await?;
        Ok(false)
    }
}
