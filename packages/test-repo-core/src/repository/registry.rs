//! Per-document lock registry.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Lock serializing read-modify-write cycles on one document.
pub type DocumentLock = Arc<Mutex<()>>;

/// Maps document paths to their write locks.
///
/// Two paths naming the same file through the same directory resolve to the
/// same lock. Entries with no live repository handle are pruned on the next
/// lookup.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, DocumentLock>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `path`, creating it on first use.
    pub fn lock_for(&self, path: &Path) -> (PathBuf, DocumentLock) {
        let key = normalize(path);
        let mut locks = self.locks.lock();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let lock = locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        (key, lock)
    }

    /// Number of documents with live handles.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds a key that stays the same before and after the data directory is
/// created: the deepest existing ancestor of the parent is canonicalized and the
/// components below it, which cannot be symlinks, are resolved lexically. The
/// file name itself is never resolved.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let components: Vec<Component<'_>> = absolute.components().collect();
    let Some((file_name, dirs)) = components.split_last() else {
        return absolute;
    };

    for existing in (1..=dirs.len()).rev() {
        let ancestor: PathBuf = dirs[..existing].iter().collect();
        if let Ok(mut key) = fs::canonicalize(&ancestor) {
            for component in dirs[existing..].iter().chain(std::iter::once(file_name)) {
                match component {
                    Component::CurDir => {}
                    Component::ParentDir => {
                        key.pop();
                    }
                    other => key.push(other.as_os_str()),
                }
            }
            return key;
        }
    }
    absolute
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_same_document_shares_lock() {
        let temp_dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let direct = temp_dir.path().join("tests.json");
        let dotted = temp_dir.path().join(".").join("tests.json");

        let (key_a, lock_a) = registry.lock_for(&direct);
        let (key_b, lock_b) = registry.lock_for(&dotted);

        assert_eq!(key_a, key_b);
        assert!(Arc::ptr_eq(&lock_a, &lock_b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_key_is_stable_when_directory_appears() {
        let temp_dir = tempdir().unwrap();
        let registry = LockRegistry::new();
        let path = temp_dir.path().join("a").join("..").join("data").join("tests.json");

        let (key_before, lock_before) = registry.lock_for(&path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let (key_after, lock_after) = registry.lock_for(&path);

        assert_eq!(key_before, key_after);
        assert!(Arc::ptr_eq(&lock_before, &lock_after));
        assert_eq!(
            key_after,
            fs::canonicalize(temp_dir.path()).unwrap().join("data").join("tests.json")
        );
    }

    #[test]
    fn test_different_documents_do_not_share_lock() {
        let temp_dir = tempdir().unwrap();
        let registry = LockRegistry::new();

        let (_, lock_a) = registry.lock_for(&temp_dir.path().join("a.json"));
        let (_, lock_b) = registry.lock_for(&temp_dir.path().join("b.json"));

        assert!(!Arc::ptr_eq(&lock_a, &lock_b));
        let _held = lock_a.lock();
        assert!(lock_b.try_lock().is_some());
    }

    #[test]
    fn test_released_locks_are_pruned() {
        let temp_dir = tempdir().unwrap();
        let registry = LockRegistry::new();

        let (_, lock) = registry.lock_for(&temp_dir.path().join("a.json"));
        assert_eq!(registry.len(), 1);
        drop(lock);
        assert!(registry.is_empty());

        let (_, _other) = registry.lock_for(&temp_dir.path().join("b.json"));
        assert_eq!(registry.locks.lock().len(), 1);
    }
}
