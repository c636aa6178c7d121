//! Document round-trip and CRUD behavior through the public API.

use serde_json::json;
use tempfile::tempdir;

use test_repo_core::{RepoError, TestRecord};

use super::helpers::{raw_document, seed, store_in, writing_task};

#[test]
fn test_worked_example() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    seed(temp_dir.path(), json!({"tests": [{"test_id": 1, "title": "A"}]}));
    let repo = store_in(temp_dir.path()).default_repository();

    let record = TestRecord::from_value(json!({"title": "B"}))?;
    let stored = repo.append(record)?;
    assert_eq!(serde_json::to_value(&stored)?, json!({"test_id": 2, "title": "B"}));

    assert_eq!(
        serde_json::to_value(repo.list_all()?)?,
        json!({"tests": [{"test_id": 1, "title": "A"}, {"test_id": 2, "title": "B"}]})
    );
    Ok(())
}

#[test]
fn test_list_all_returns_last_written_state() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    seed(temp_dir.path(), json!({"tests": [], "exam": "IELTS Academic"}));
    let repo = store_in(temp_dir.path()).default_repository();

    repo.append(writing_task("Line graph: energy use", 1))?;
    repo.append(writing_task("Opinion: remote work", 2))?;

    let on_disk = raw_document(temp_dir.path());
    let listed = serde_json::to_value(repo.list_all()?)?;
    assert_eq!(listed, on_disk);
    assert_eq!(serde_json::to_value(repo.list_all()?)?, listed);
    assert_eq!(on_disk["exam"], json!("IELTS Academic"));
    Ok(())
}

#[test]
fn test_full_lifecycle() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    seed(temp_dir.path(), json!({"tests": []}));
    let repo = store_in(temp_dir.path()).default_repository();

    let a = repo.append(writing_task("Bar chart", 1))?.test_id.unwrap();
    let b = repo.append(writing_task("Discuss both views", 2))?.test_id.unwrap();
    let c = repo.append(writing_task("Process diagram", 1))?.test_id.unwrap();
    assert_eq!((a, b, c), (1, 2, 3));

    let mut revised = writing_task("Discuss both views (revised)", 2);
    revised.test_id = Some(b);
    repo.replace(revised)?;
    repo.remove(a)?;

    let doc = repo.list_all()?;
    let titles: Vec<&str> = doc
        .tests
        .iter()
        .map(|r| r.attributes["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Discuss both views (revised)", "Process diagram"]);

    let next = repo.append(writing_task("Letter", 1))?;
    assert_eq!(next.test_id, Some(4));
    assert_eq!(doc.tests.len() + 1, repo.list_all()?.tests.len());
    Ok(())
}

#[test]
fn test_failed_mutations_leave_document_untouched() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    seed(temp_dir.path(), json!({"tests": [{"test_id": 1, "title": "A"}]}));
    let repo = store_in(temp_dir.path()).default_repository();
    let before = std::fs::read(repo.path())?;

    let mut ghost = writing_task("ghost", 1);
    ghost.test_id = Some(2);
    assert!(matches!(
        repo.replace(ghost),
        Err(RepoError::RecordNotFound { test_id: 2 })
    ));

    let mut clash = writing_task("clash", 1);
    clash.test_id = Some(1);
    assert!(matches!(
        repo.append(clash),
        Err(RepoError::DuplicateIdentifier { test_id: 1 })
    ));

    assert_eq!(std::fs::read(repo.path())?, before);
    Ok(())
}
