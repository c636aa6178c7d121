//! I/O utilities for persistence operations.

use std::path::Path;

use crate::error::RepoError;

/// Wraps an I/O error as `StorageUnavailable` with its path and context.
pub fn classify_io_error(error: std::io::Error, path: &Path, context: &'static str) -> RepoError {
    RepoError::StorageUnavailable {
        path: path.display().to_string(),
        context,
        kind: error.kind(),
        message: error.to_string(),
    }
}

/// Directory a document lives in; `.` for bare file names.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Flushes directory metadata so a completed rename survives a crash.
#[cfg(unix)]
pub fn sync_dir(dir: &Path) -> Result<(), RepoError> {
    std::fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| classify_io_error(e, dir, "sync directory"))
}

/// Directory handles cannot be synced on this platform.
#[cfg(not(unix))]
pub fn sync_dir(_dir: &Path) -> Result<(), RepoError> {
    Ok(())
}
