//! Repository error types.

use std::io::ErrorKind;

use thiserror::Error;

/// Test repository operation errors.
#[derive(Error, Debug, Clone)]
pub enum RepoError {
    /// Document file missing, unreadable or unwritable
    #[error("Storage unavailable for '{path}': {context}: {message}")]
    StorageUnavailable {
        path: String,
        context: &'static str,
        kind: ErrorKind,
        message: String,
    },

    /// Document contents do not parse as a test document
    #[error("Corrupt document '{path}': {reason}")]
    CorruptDocument { path: String, reason: String },

    /// No record carries the requested test id
    #[error("Test {test_id} not found")]
    RecordNotFound { test_id: u64 },

    /// Request is missing a required identifier or is otherwise malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Caller-supplied test id is already taken
    #[error("Test id {test_id} already exists")]
    DuplicateIdentifier { test_id: u64 },

    /// No test id left to allocate
    #[error("Test id space exhausted")]
    IdentifierOverflow,

    /// Document lock could not be acquired in time
    #[error("Timed out after {waited_ms} ms waiting for lock on '{path}'")]
    LockTimeout { path: String, waited_ms: u64 },

    /// Document could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RepoError {
    /// Returns true if the error leaves the caller free to retry unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            RepoError::LockTimeout { .. } => true,
            RepoError::StorageUnavailable { kind, .. } => matches!(
                kind,
                ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}
