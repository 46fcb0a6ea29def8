//! Promoting captured screenshots to reference images.

use crate::config::TestOptions;
use crate::fs::{empty_dir, ensure_dir};
use std::io;
use std::path::{Path, PathBuf};
use storycheck_core::CoreError;
use tokio::fs;

/// Accept the current captures as the new references.
///
/// With `diff_only` false the reference directory is emptied and every
/// `.png` in the output directory is moved in. With `diff_only` true
/// only the stories that actually changed (those with a file in the
/// difference directory) are promoted: their captures are copied over
/// the existing references, and nothing else is touched, so references
/// without a fresh capture survive.
///
/// Returns the number of approved images; finding none is
/// [`CoreError::NothingToApprove`].
pub async fn approve_images(options: &TestOptions, diff_only: bool) -> Result<usize, CoreError> {
    let input_dir = if diff_only {
        &options.difference_dir
    } else {
        &options.output_dir
    };
    let files = png_files(input_dir).await?;
    if files.is_empty() {
        return Err(CoreError::NothingToApprove);
    }

    if diff_only {
        ensure_dir(&options.reference_dir).await?;
        for file in &files {
            fs::copy(options.output_dir.join(file), options.reference_dir.join(file)).await?;
        }
        return Ok(files.len());
    }

    empty_dir(&options.reference_dir).await?;
    for file in &files {
        move_file(
            &options.output_dir.join(file),
            &options.reference_dir.join(file),
        )
        .await?;
    }
    Ok(files.len())
}

/// The `.png` file names in `dir`, sorted; a missing directory counts
/// as empty.
async fn png_files(dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let mut reader = match fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut files = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let name = PathBuf::from(entry.file_name());
        if name.extension().is_some_and(|ext| ext == "png") {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

// Rename where possible, copy-and-delete across filesystems.
async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to).await?;
            fs::remove_file(from).await
        }
    }
}
