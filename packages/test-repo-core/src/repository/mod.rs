//! Test repository: CRUD over one persisted test document.
//!
//! Every mutating operation runs its whole load, mutate, write cycle while
//! holding the document's lock, so concurrent cycles on the same document
//! never interleave. Reads take no lock and rely on atomic replacement.

mod registry;


use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::MutexGuard;
use serde_json::Value;

use crate::config::{DeletePolicy, IdAllocation, StoreConfig, HIGH_WATER_MARK_KEY};
use crate::document::{TestDocument, TestRecord};
use crate::error::RepoError;
use crate::persistence::{load_document, write_document_atomic};

pub use registry::{DocumentLock, LockRegistry};

/// Hands out repositories whose locks are keyed by document path.
#[derive(Debug)]
pub struct TestStore {
    config: Arc<StoreConfig>,
    locks: LockRegistry,
}

impl TestStore {
    /// Creates a store with the given configuration.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config: Arc::new(config),
            locks: LockRegistry::new(),
        }
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens the repository for the document at `path`.
    ///
    /// Repositories opened for the same document share one lock.
    pub fn open(&self, path: impl AsRef<Path>) -> TestRepository {
        let (path, lock) = self.locks.lock_for(path.as_ref());
        TestRepository {
            path,
            lock,
            config: Arc::clone(&self.config),
        }
    }

    /// Opens the default document, `data_dir/document_name`.
    pub fn default_repository(&self) -> TestRepository {
        self.open(self.config.document_path())
    }

    /// Opens the named collection document, `data_dir/<name>.json`.
    pub fn collection(&self, name: &str) -> Result<TestRepository, RepoError> {
        let path = self.config.collection_path(name)?;
        Ok(self.open(path))
    }

    /// Number of documents with open repositories.
    pub fn open_documents(&self) -> usize {
        self.locks.len()
    }
}

/// Handle on one test document.
///
/// Cheap to clone; clones share the document lock.
#[derive(Debug, Clone)]
pub struct TestRepository {
    path: PathBuf,
    lock: DocumentLock,
    config: Arc<StoreConfig>,
}

impl TestRepository {
    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the full document.
    ///
    /// # Returns
    /// `Result<TestDocument, RepoError>` with `StorageUnavailable` when the
    /// file cannot be read and `CorruptDocument` when it does not decode.
    pub fn list_all(&self) -> Result<TestDocument, RepoError> {
        tracing::debug!("list_all {}", self.path.display());
        self.load()
    }

    /// Looks up one record by id.
    pub fn get(&self, test_id: u64) -> Result<TestRecord, RepoError> {
        self.load()?
            .find(test_id)
            .cloned()
            .ok_or(RepoError::RecordNotFound { test_id })
    }

    /// Replaces the record carrying `record.test_id`, keeping its position.
    ///
    /// The whole record is swapped; fields absent from `record` are dropped.
    /// When no record matches, nothing is written.
    ///
    /// # Returns
    /// `Result<TestRecord, RepoError>` containing the stored record.
    pub fn replace(&self, record: TestRecord) -> Result<TestRecord, RepoError> {
        let test_id = record
            .test_id
            .ok_or_else(|| RepoError::InvalidRequest("test_id is required".to_string()))?;
        check_record(&record)?;

        self.mutate("replace", |doc| {
            let position = doc
                .position_of(test_id)
                .ok_or(RepoError::RecordNotFound { test_id })?;
            doc.tests[position] = record;
            tracing::debug!("Replaced test {} at position {}", test_id, position);
            Ok(doc.tests[position].clone())
        })
    }

    /// Appends a record, allocating an id when none is given.
    ///
    /// A caller-supplied id that already exists is rejected with
    /// `DuplicateIdentifier`.
    ///
    /// # Returns
    /// `Result<TestRecord, RepoError>` containing the stored record.
    pub fn append(&self, mut record: TestRecord) -> Result<TestRecord, RepoError> {
        check_record(&record)?;
        let policy = self.config.id_allocation;

        self.mutate("append", |doc| {
            let test_id = match record.test_id {
                Some(test_id) => {
                    if doc.contains(test_id) {
                        return Err(RepoError::DuplicateIdentifier { test_id });
                    }
                    test_id
                }
                None => next_test_id(doc, policy, &self.path)?,
            };
            if policy == IdAllocation::Monotonic {
                raise_high_water_mark(doc, test_id, &self.path)?;
            }

            record.test_id = Some(test_id);
            doc.tests.push(record);
            tracing::debug!("Appended test {} ({} total)", test_id, doc.len());
            Ok(doc.tests[doc.len() - 1].clone())
        })
    }

    /// Removes every record carrying `test_id`.
    ///
    /// Under [`DeletePolicy::Lenient`] an absent id still succeeds and the
    /// document is rewritten; under [`DeletePolicy::Strict`] it fails with
    /// `RecordNotFound` and nothing is written.
    pub fn remove(&self, test_id: u64) -> Result<(), RepoError> {
        if test_id == 0 {
            return Err(RepoError::InvalidRequest(
                "test_id must be a positive integer".to_string(),
            ));
        }
        let policy = self.config.delete_policy;

        self.mutate("remove", |doc| {
            let before = doc.len();
            doc.tests.retain(|r| r.test_id != Some(test_id));
            let removed = before - doc.len();
            if removed == 0 && policy == DeletePolicy::Strict {
                return Err(RepoError::RecordNotFound { test_id });
            }
            tracing::debug!("Removed test {} ({} records)", test_id, removed);
            Ok(())
        })
    }

    fn load(&self) -> Result<TestDocument, RepoError> {
        load_document(&self.path, self.config.create_if_missing)
    }

    /// Runs one read-modify-write cycle under the document lock.
    ///
    /// `apply` returning an error aborts the cycle before anything is written.
    fn mutate<T, F>(&self, operation: &'static str, apply: F) -> Result<T, RepoError>
    where
        F: FnOnce(&mut TestDocument) -> Result<T, RepoError>,
    {
        let _guard = self.acquire()?;

        let mut doc = self.load()?;
        let result = apply(&mut doc)?;

        if let Err(e) = write_document_atomic(&self.path, &doc, self.config.pretty) {
            tracing::warn!("{} on {} failed to persist: {}", operation, self.path.display(), e);
            return Err(e);
        }
        Ok(result)
    }

    fn acquire(&self) -> Result<MutexGuard<'_, ()>, RepoError> {
        let timeout_ms = self.config.lock_timeout_ms;
        if timeout_ms == 0 {
            return Ok(self.lock.lock());
        }
        self.lock
            .try_lock_for(Duration::from_millis(timeout_ms))
            .ok_or_else(|| RepoError::LockTimeout {
                path: self.path.display().to_string(),
                waited_ms: timeout_ms,
            })
    }
}

/// Rejects records whose attributes would shadow the id on disk.
fn check_record(record: &TestRecord) -> Result<(), RepoError> {
    if record.test_id == Some(0) {
        return Err(RepoError::InvalidRequest(
            "test_id must be a positive integer".to_string(),
        ));
    }
    if record.attributes.contains_key("test_id") {
        return Err(RepoError::InvalidRequest(
            "test_id must not appear among record attributes".to_string(),
        ));
    }
    Ok(())
}

fn next_test_id(doc: &TestDocument, policy: IdAllocation, path: &Path) -> Result<u64, RepoError> {
    let current_max = doc.max_test_id().unwrap_or(0);
    let base = match policy {
        IdAllocation::MaxPlusOne => current_max,
        IdAllocation::Monotonic => current_max.max(high_water_mark(doc, path)?),
    };
    base.checked_add(1).ok_or(RepoError::IdentifierOverflow)
}

fn high_water_mark(doc: &TestDocument, path: &Path) -> Result<u64, RepoError> {
    match doc.metadata.get(HIGH_WATER_MARK_KEY) {
        None => Ok(0),
        Some(value) => value.as_u64().ok_or_else(|| RepoError::CorruptDocument {
            path: path.display().to_string(),
            reason: format!("{} must be a non-negative integer", HIGH_WATER_MARK_KEY),
        }),
    }
}

fn raise_high_water_mark(doc: &mut TestDocument, test_id: u64, path: &Path) -> Result<(), RepoError> {
    if test_id > high_water_mark(doc, path)? {
        doc.metadata
            .insert(HIGH_WATER_MARK_KEY.to_string(), Value::from(test_id));
    }
    Ok(())
}
