//! API configuration.

/// HTTP layer configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Maximum time to receive a request body in milliseconds
    pub request_timeout_ms: u64,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5000,    // 5 seconds default
            max_body_bytes: 1024 * 1024, // 1 MiB default
        }
    }
}
