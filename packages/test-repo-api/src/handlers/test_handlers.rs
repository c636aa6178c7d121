//! Test repository endpoint handlers.

use hyper::{body::Bytes, Request, Response};

use crate::router::RouterError;
use test_repo_core::TestRepository;

use super::request_utils::{json_response, parse_id_query, parse_record, run_blocking};
use super::response::{success_response, test_response, AckResponse};

/// Lists the whole document.
///
/// # Endpoint
/// `GET /tests`
///
/// # Response
/// - **200 OK**: The persisted document, metadata included
/// ```json
/// {
///   "tests": [{"test_id": 1, "title": "Bar chart"}],
///   "exam": "IELTS Academic"
/// }
/// ```
///
/// # Errors
/// - **500 Internal Server Error**: Document missing, unreadable or corrupt
pub async fn list_tests(repo: TestRepository) -> Result<Response<Bytes>, RouterError> {
    let document = run_blocking(move || repo.list_all()).await?;
    json_response(200, &document)
}

/// Reads one test.
///
/// # Endpoint
/// `GET /tests/{id}`
///
/// # Errors
/// - **400 Bad Request**: Invalid test ID
/// - **404 Not Found**: No test with that ID
/// - **500 Internal Server Error**: Document unreadable or corrupt
pub async fn get_test(repo: TestRepository, test_id: u64) -> Result<Response<Bytes>, RouterError> {
    let record = run_blocking(move || repo.get(test_id)).await?;
    json_response(200, &test_response(record))
}

/// Replaces a test in place.
///
/// # Endpoint
/// `PUT /tests`
///
/// # Request Body
/// The complete record, including `test_id`. Attributes not present in the
/// body are dropped from the stored record.
/// ```json
/// {"test_id": 2, "title": "Discuss both views", "task_type": 2}
/// ```
///
/// # Response
/// - **200 OK**: `{"success": true, "test": {...}}`
///
/// # Errors
/// - **400 Bad Request**: Unparsable body or missing `test_id`
/// - **404 Not Found**: No test with that ID; the document is unchanged
/// - **500 Internal Server Error**: I/O or parse failure
///
/// # Example
/// ```bash
/// curl -X PUT http://localhost:8080/tests \
///   -H "Content-Type: application/json" \
///   -d '{"test_id": 2, "title": "Revised"}'
/// ```
pub async fn replace_test(
    req: Request<Bytes>,
    repo: TestRepository,
) -> Result<Response<Bytes>, RouterError> {
    let record = parse_record(req.body())?;
    if record.test_id.is_none() {
        return Err(RouterError::BadRequest("Test ID is required".to_string()));
    }

    let stored = run_blocking(move || repo.replace(record)).await?;
    json_response(200, &test_response(stored))
}

/// Appends a test.
///
/// # Endpoint
/// `POST /tests`
///
/// # Request Body
/// ```json
/// {"title": "Opinion: remote work", "task_type": 2}
/// ```
///
/// # Response
/// - **200 OK**: `{"success": true, "test": {"test_id": 3, ...}}`
///
/// # Errors
/// - **400 Bad Request**: Unparsable body
/// - **409 Conflict**: Supplied `test_id` already exists
/// - **500 Internal Server Error**: I/O or parse failure
///
/// # Notes
/// - `test_id` is allocated when absent
pub async fn append_test(
    req: Request<Bytes>,
    repo: TestRepository,
) -> Result<Response<Bytes>, RouterError> {
    let record = parse_record(req.body())?;
    let stored = run_blocking(move || repo.append(record)).await?;
    json_response(200, &test_response(stored))
}

/// Removes a test.
///
/// # Endpoint
/// `DELETE /tests?id={id}`
///
/// # Response
/// - **200 OK**: `{"success": true}`, also when the ID did not exist under
///   the lenient delete policy
///
/// # Errors
/// - **400 Bad Request**: `id` missing, zero or not a number
/// - **404 Not Found**: ID absent under the strict delete policy
/// - **500 Internal Server Error**: I/O or parse failure
pub async fn remove_test(
    req: Request<Bytes>,
    repo: TestRepository,
) -> Result<Response<Bytes>, RouterError> {
    let test_id = parse_id_query(req.uri().query())?;
    run_blocking(move || repo.remove(test_id)).await?;
    json_response(200, &AckResponse { success: true })
}

/// Liveness probe.
///
/// # Endpoint
/// `GET /health`
pub fn health() -> Result<Response<Bytes>, RouterError> {
    json_response(200, &success_response("ok"))
}
