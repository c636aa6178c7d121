//! Matchit routing configuration.

use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use matchit::Router as MatchitRouter;

use crate::config::ApiConfig;
use crate::handlers;
use test_repo_core::{TestRepository, TestStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Test store handing out per-document repositories
    pub store: Arc<TestStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Repository addressed by the route: the named collection when a
    /// `name` parameter matched, the default document otherwise.
    fn repository(&self, params: &matchit::Params<'_, '_>) -> Result<TestRepository, RouterError> {
        match params.get("name") {
            Some(name) => self
                .store
                .collection(name)
                .map_err(handlers::map_repo_error),
            None => Ok(self.store.default_repository()),
        }
    }
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

impl Router {
    /// Creates a new router with default routes.
    pub fn new(store: Arc<TestStore>, config: Arc<ApiConfig>) -> Self {
        let mut router = MatchitRouter::new();

        router
            .insert("/health", RouteHandler::Health)
            .expect("Failed to insert /health route");

        // Default document
        router
            .insert("/tests", RouteHandler::Tests)
            .expect("Failed to insert /tests route");
        router
            .insert("/tests/{id}", RouteHandler::TestById)
            .expect("Failed to insert /tests/{id} route");

        // Named collections
        router
            .insert("/collections/{name}/tests", RouteHandler::Tests)
            .expect("Failed to insert /collections/{name}/tests route");
        router
            .insert("/collections/{name}/tests/{id}", RouteHandler::TestById)
            .expect("Failed to insert /collections/{name}/tests/{id} route");

        Self {
            inner: router,
            state: AppState { store, config },
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// The body is read once, bounded by the configured timeout and size
    /// limit, before dispatch.
    ///
    /// # Arguments
    /// * `req` - HTTP request
    ///
    /// # Returns
    /// `Result<Response<Bytes>, RouterError>` containing the response or an error.
    pub async fn route<B>(&self, req: Request<B>) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let path = req.uri().path().to_string();

        let matched = match self.inner.at(&path) {
            Ok(matched) => matched,
            Err(_) => {
                return Err(RouterError::NotFound(format!(
                    "No route found for {}",
                    path
                )))
            }
        };

        let (parts, body) = req.into_parts();
        let body = handlers::read_request_body(body, &self.state.config).await?;
        let req = Request::from_parts(parts, body);

        tracing::debug!("{} {}", req.method(), path);
        matched
            .value
            .handle(req, matched.params, self.state.clone())
            .await
    }
}

/// Route handler function.
enum RouteHandler {
    Health,
    Tests,
    TestById,
}

impl RouteHandler {
    /// Handles a request with the given route parameters.
    async fn handle(
        &self,
        req: Request<Bytes>,
        params: matchit::Params<'_, '_>,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError> {
        match self {
            RouteHandler::Health => {
                if req.method() == Method::GET {
                    handlers::health()
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
            RouteHandler::Tests => {
                let repo = state.repository(&params)?;
                match req.method() {
                    &Method::GET => handlers::list_tests(repo).await,
                    &Method::PUT => handlers::replace_test(req, repo).await,
                    &Method::POST => handlers::append_test(req, repo).await,
                    &Method::DELETE => handlers::remove_test(req, repo).await,
                    _ => Err(RouterError::MethodNotAllowed),
                }
            }
            RouteHandler::TestById => {
                if req.method() != Method::GET {
                    return Err(RouterError::MethodNotAllowed);
                }
                let repo = state.repository(&params)?;
                let test_id = handlers::parse_test_id(params.get("id"))?;
                handlers::get_test(repo, test_id).await
            }
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(usize),
    ServiceUnavailable(String),
}

impl RouterError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            RouterError::MethodNotAllowed => 405,
            RouterError::InternalError(_) => 500,
            RouterError::Timeout => 408,
            RouterError::BadRequest(_) => 400,
            RouterError::NotFound(_) => 404,
            RouterError::Conflict(_) => 409,
            RouterError::PayloadTooLarge(_) => 413,
            RouterError::ServiceUnavailable(_) => 503,
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RouterError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            RouterError::PayloadTooLarge(limit) => {
                write!(f, "Payload Too Large: body exceeds {} bytes", limit)
            }
            RouterError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let message = match &err {
            RouterError::MethodNotAllowed => "Method Not Allowed".to_string(),
            RouterError::Timeout => "Request Timeout".to_string(),
            RouterError::InternalError(msg)
            | RouterError::BadRequest(msg)
            | RouterError::NotFound(msg)
            | RouterError::Conflict(msg)
            | RouterError::ServiceUnavailable(msg) => msg.clone(),
            RouterError::PayloadTooLarge(_) => err.to_string(),
        };

        let error_response = handlers::error_response(status, message);
        let body = serde_json::to_vec(&error_response)
            .unwrap_or_else(|e| format!("{{\"success\":false,\"error\":{{\"code\":\"500\",\"message\":\"Failed to serialize error: {}\"}}}}", e).into_bytes());

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Bytes::from(body))
            .unwrap_or_else(|_| {
                Response::builder()
                    .status(500)
                    .body(Bytes::from("Internal Server Error"))
                    .expect("Failed to build fallback error response")
            })
    }
}
