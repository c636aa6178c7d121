//! Document load and atomic write.
//!
//! Writes never touch the live file in place: the new document goes to a
//! temporary file in the same directory, is synced, and is renamed over the
//! target. A reader therefore sees either the previous document or the new
//! one, and an interrupted write leaves the previous document in place.

pub mod io_utils;


use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::document::TestDocument;
use crate::error::RepoError;

use io_utils::{classify_io_error, parent_dir, sync_dir};

/// Loads and validates the document at `path`.
///
/// # Arguments
/// * `path` - Document path
/// * `create_if_missing` - Read a missing file as an empty document
///
/// # Returns
/// `Result<TestDocument, RepoError>` containing the decoded document.
pub fn load_document(path: &Path, create_if_missing: bool) -> Result<TestDocument, RepoError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if create_if_missing && e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Document {} missing, starting empty", path.display());
            return Ok(TestDocument::default());
        }
        Err(e) => return Err(classify_io_error(e, path, "read document")),
    };

    TestDocument::from_slice(&bytes).map_err(|reason| RepoError::CorruptDocument {
        path: path.display().to_string(),
        reason,
    })
}

/// Replaces the document at `path` atomically.
///
/// # Arguments
/// * `path` - Document path
/// * `document` - Document to persist
/// * `pretty` - Write indented JSON
///
/// # Returns
/// `Result<(), RepoError>` indicating success or failure.
pub fn write_document_atomic(
    path: &Path,
    document: &TestDocument,
    pretty: bool,
) -> Result<(), RepoError> {
    let bytes = document
        .to_vec(pretty)
        .map_err(|e| RepoError::SerializationError(e.to_string()))?;

    let dir = parent_dir(path);
    fs::create_dir_all(dir).map_err(|e| classify_io_error(e, dir, "create data directory"))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let prefix = format!(".{}.", file_name);
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".tmp");
    // A new document gets the usual 0666-minus-umask mode instead of 0600.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    // Dropped before persist() means removed, so failures below leave no debris.
    let mut temp = builder
        .tempfile_in(dir)
        .map_err(|e| classify_io_error(e, dir, "create temp file"))?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| classify_io_error(e, temp.path(), "copy permissions"))?;
    }

    temp.write_all(&bytes)
        .map_err(|e| classify_io_error(e, temp.path(), "write temp file"))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| classify_io_error(e, temp.path(), "sync temp file"))?;

    temp.persist(path)
        .map_err(|e| classify_io_error(e.error, path, "replace document"))?;

    // The new document is already in place; a failed directory sync only
    // weakens crash durability.
    if let Err(e) = sync_dir(dir) {
        tracing::warn!("Directory sync after writing {} failed: {}", path.display(), e);
    }

    tracing::debug!(
        "Wrote {} ({} tests, {} bytes)",
        path.display(),
        document.len(),
        bytes.len()
    );
    Ok(())
}
