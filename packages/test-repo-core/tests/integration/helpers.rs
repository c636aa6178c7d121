//! Shared fixtures.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};
use test_repo_core::{StoreConfig, TestRecord, TestStore};

/// Store rooted at `dir` whose default document is `tests.json`.
pub fn store_in(dir: &Path) -> TestStore {
    TestStore::new(StoreConfig {
        data_dir: dir.to_path_buf(),
        document_name: "tests.json".to_string(),
        ..Default::default()
    })
}

/// Writes `body` as the default document in `dir`.
pub fn seed(dir: &Path, body: Value) {
    fs::write(dir.join("tests.json"), serde_json::to_vec_pretty(&body).unwrap()).unwrap();
}

/// Record with a title and a task type, no id.
pub fn writing_task(title: &str, task: u8) -> TestRecord {
    let min_words = if task == 1 { 150 } else { 250 };
    let mut attributes = Map::new();
    attributes.insert("title".to_string(), json!(title));
    attributes.insert("task_type".to_string(), json!(task));
    attributes.insert("min_words".to_string(), json!(min_words));
    TestRecord::new(attributes)
}

/// Raw JSON of the default document in `dir`.
pub fn raw_document(dir: &Path) -> Value {
    serde_json::from_slice(&fs::read(dir.join("tests.json")).unwrap()).unwrap()
}
