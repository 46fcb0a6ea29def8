//! The capture-to-verdict step for one story.

use crate::config::TestOptions;
use crate::fs::{output_file, path_exists};
use crate::paths::{output_paths, FileNameFormatter};
use std::path::PathBuf;
use storycheck_core::{CoreError, ImageDiffer, Story};

/// Compare one captured screenshot against its reference image.
///
/// A missing reference is written on the spot unless references are
/// required; `update_reference` routes every capture straight to the
/// reference directory. Otherwise the capture lands in the output
/// directory and the differ decides between `Ok` and
/// [`CoreError::Mismatch`].
pub async fn compare_screenshot(
    screenshot: Option<Vec<u8>>,
    differ: &dyn ImageDiffer,
    options: &TestOptions,
    formatter: &FileNameFormatter,
    tolerance: f64,
    configuration_name: &str,
    story: &Story,
) -> Result<(), CoreError> {
    let Some(screenshot) = screenshot else {
        return Err(CoreError::CaptureFailed {
            story: story.full_name(),
        });
    };

    let paths = output_paths(options, formatter, configuration_name, story);
    let reference_exists = path_exists(&paths.reference).await;
    let update_reference =
        options.update_reference || (!options.require_reference && !reference_exists);

    let destination = if update_reference {
        &paths.reference
    } else {
        &paths.candidate
    };
    output_file(destination, &screenshot).await?;

    if update_reference {
        return Ok(());
    }
    if !reference_exists {
        return Err(CoreError::MissingReference {
            story: story.full_name(),
        });
    }

    let images_match = differ
        .images_match(&paths.reference, &paths.candidate, &paths.diff, tolerance)
        .await?;
    if !images_match {
        return Err(CoreError::Mismatch {
            story: story.full_name(),
            diff_path: relative_to_cwd(paths.diff),
        });
    }
    Ok(())
}

// Reported paths read better relative to the working directory.
fn relative_to_cwd(path: PathBuf) -> PathBuf {
    match std::env::current_dir() {
        Ok(cwd) => match path.strip_prefix(&cwd) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => path,
        },
        Err(_) => path,
    }
}
