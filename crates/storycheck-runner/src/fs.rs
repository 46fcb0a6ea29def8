//! Filesystem helpers for screenshot directories.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// True if `path` exists, of any kind.
pub async fn path_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Create `path` and any missing parents.
pub async fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await
}

/// Write `bytes` to `path`, creating parent directories as needed.
pub async fn output_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await
}

/// Recreate `path` as an empty directory.
pub async fn empty_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    fs::create_dir_all(path).await
}

/// Write a `.gitignore` covering the given directories so generated
/// screenshots stay out of version control.
///
/// The file lands in the parent of the first directory and lists the
/// given paths that are descendants of that parent, one per line with a
/// trailing newline. An existing `.gitignore` is left untouched.
pub async fn place_gitignore(paths: &[PathBuf]) -> io::Result<()> {
    let Some(parent) = paths.first().and_then(|path| path.parent()) else {
        return Ok(());
    };
    let gitignore = parent.join(".gitignore");
    if path_exists(&gitignore).await {
        return Ok(());
    }

    let mut entries = Vec::new();
    for path in paths {
        if let Ok(relative) = path.strip_prefix(parent) {
            if !relative.as_os_str().is_empty() {
                entries.push(relative.display().to_string());
            }
        }
    }
    if entries.is_empty() {
        return Ok(());
    }

    ensure_dir(parent).await?;
    fs::write(&gitignore, format!("{}\n", entries.join("\n"))).await
}
