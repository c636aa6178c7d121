//! Response types and helpers for HTTP endpoints.

use serde::Serialize;
use test_repo_core::TestRecord;

/// Consistent API response wrapper for success responses
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always true for success responses
    pub success: bool,
    /// Response data
    pub data: T,
}

/// Response carrying one stored test
#[derive(Debug, Serialize)]
pub struct TestResponse {
    /// Always true for success responses
    pub success: bool,
    /// Record as persisted, including its id
    pub test: TestRecord,
}

/// Response for operations with no payload
#[derive(Debug, Serialize)]
pub struct AckResponse {
    /// Always true for success responses
    pub success: bool,
}

/// Consistent API error response wrapper
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error code (HTTP status code as string)
    pub code: String,
    /// Error message
    pub message: String,
}

/// Consistent error response wrapper
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false for error responses
    pub success: bool,
    /// Error information
    pub error: ApiError,
}

/// Helper to create success response
pub fn success_response<T: Serialize>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
    }
}

/// Helper to create a stored-test response
pub fn test_response(test: TestRecord) -> TestResponse {
    TestResponse {
        success: true,
        test,
    }
}

/// Helper to create error response
pub fn error_response(code: u16, message: String) -> ErrorResponse {
    ErrorResponse {
        success: false,
        error: ApiError {
            code: code.to_string(),
            message,
        },
    }
}
