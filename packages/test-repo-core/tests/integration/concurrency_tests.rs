//! Concurrent writers and readers against shared documents.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use ntest::timeout;
use serde_json::json;
use tempfile::tempdir;

use test_repo_core::{StoreConfig, TestStore};

use super::helpers::{seed, store_in, writing_task};

#[timeout(10000)]
#[test]
fn test_concurrent_appends_have_no_lost_updates() {
    const WRITERS: u64 = 16;
    const PER_WRITER: u64 = 8;

    let temp_dir = tempdir().unwrap();
    seed(temp_dir.path(), json!({"tests": []}));
    let store = Arc::new(store_in(temp_dir.path()));

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let repo = store.default_repository();
            thread::spawn(move || {
                (0..PER_WRITER)
                    .map(|i| {
                        repo.append(writing_task(&format!("w{}-{}", w, i), 2))
                            .unwrap()
                            .test_id
                            .unwrap()
                    })
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let returned: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let total = WRITERS * PER_WRITER;
    let unique: HashSet<u64> = returned.iter().copied().collect();
    assert_eq!(unique.len() as u64, total);
    assert_eq!(unique, (1..=total).collect::<HashSet<u64>>());

    let doc = store.default_repository().list_all().unwrap();
    assert_eq!(doc.len() as u64, total);
}

#[timeout(10000)]
#[test]
fn test_mixed_writers_keep_ids_unique() {
    let temp_dir = tempdir().unwrap();
    seed(temp_dir.path(), json!({"tests": []}));
    let store = Arc::new(store_in(temp_dir.path()));

    thread::scope(|scope| {
        for w in 0..8 {
            let repo = store.default_repository();
            scope.spawn(move || {
                for i in 0..10 {
                    let stored = repo.append(writing_task("t", 1)).unwrap();
                    if (w + i) % 3 == 0 {
                        repo.remove(stored.test_id.unwrap()).unwrap();
                    }
                }
            });
        }
    });

    let doc = store.default_repository().list_all().unwrap();
    let ids: Vec<u64> = doc.tests.iter().map(|r| r.test_id.unwrap()).collect();
    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
}

#[timeout(10000)]
#[test]
fn test_documents_progress_independently() {
    let temp_dir = tempdir().unwrap();
    let store = Arc::new(TestStore::new(StoreConfig {
        data_dir: temp_dir.path().to_path_buf(),
        create_if_missing: true,
        pretty: false,
        ..Default::default()
    }));

    thread::scope(|scope| {
        for name in ["academic", "general"] {
            for _ in 0..4 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    let repo = store.collection(name).unwrap();
                    for _ in 0..5 {
                        repo.append(writing_task(name, 2)).unwrap();
                    }
                });
            }
        }
    });

    for name in ["academic", "general"] {
        let doc = store.collection(name).unwrap().list_all().unwrap();
        assert_eq!(doc.len(), 20);
        let ids: HashSet<u64> = doc.tests.iter().map(|r| r.test_id.unwrap()).collect();
        assert_eq!(ids, (1..=20).collect::<HashSet<u64>>());
    }
}
