//! Request utilities for HTTP endpoints.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::Response;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tokio::time;

use crate::config::ApiConfig;
use crate::router::RouterError;
use test_repo_core::{RepoError, TestRecord};

/// Reads a request body, bounded by the configured timeout and size limit.
pub async fn read_request_body<B>(body: B, config: &ApiConfig) -> Result<Bytes, RouterError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = config.max_body_bytes;
    let timeout_duration = time::Duration::from_millis(config.request_timeout_ms);
    let collected = time::timeout(timeout_duration, Limited::new(body, limit).collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                RouterError::PayloadTooLarge(limit)
            } else {
                RouterError::InternalError(format!("Failed to read request body: {}", e))
            }
        })?;
    Ok(collected.to_bytes())
}

/// Decodes a test record from a JSON request body.
pub fn parse_record(body: &[u8]) -> Result<TestRecord, RouterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RouterError::BadRequest("Request body is required".to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|e| RouterError::BadRequest(format!("Failed to parse request: {}", e)))
}

/// Parses a path test id.
pub fn parse_test_id(raw: Option<&str>) -> Result<u64, RouterError> {
    let raw = raw.unwrap_or("");
    let test_id: u64 = raw
        .parse()
        .map_err(|e| RouterError::BadRequest(format!("Invalid test ID '{}': {}", raw, e)))?;
    if test_id == 0 {
        return Err(RouterError::BadRequest("Test ID is required".to_string()));
    }
    Ok(test_id)
}

/// Extracts the `id` query parameter; missing, empty or zero is rejected.
pub fn parse_id_query(query_str: Option<&str>) -> Result<u64, RouterError> {
    let value = query_str.and_then(|query| {
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == "id").then(|| percent_decode_str(value).decode_utf8_lossy().into_owned())
        })
    });

    match value.as_deref() {
        None | Some("") | Some("0") => {
            Err(RouterError::BadRequest("Test ID is required".to_string()))
        }
        Some(raw) => parse_test_id(Some(raw)),
    }
}

/// Map RepoError to appropriate RouterError
pub fn map_repo_error(e: RepoError) -> RouterError {
    match e {
        RepoError::RecordNotFound { .. } => RouterError::NotFound(e.to_string()),
        RepoError::InvalidRequest(_) => RouterError::BadRequest(e.to_string()),
        RepoError::DuplicateIdentifier { .. } => RouterError::Conflict(e.to_string()),
        _ if e.is_retryable() => RouterError::ServiceUnavailable(e.to_string()),
        _ => RouterError::InternalError(e.to_string()),
    }
}

/// Runs a store operation on the blocking pool.
///
/// The operation runs to completion even if the request future is dropped.
pub async fn run_blocking<T, F>(operation: F) -> Result<T, RouterError>
where
    F: FnOnce() -> Result<T, RepoError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| RouterError::InternalError(format!("Store task failed: {}", e)))?
        .map_err(map_repo_error)
}

/// Serializes `data` into a JSON response with the given status.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(data)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    build_response(status, json)
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}
