//! HTTP endpoint implementations for the test repository.

pub mod request_utils;
pub mod response;
pub mod test_handlers;

pub use request_utils::{map_repo_error, parse_id_query, parse_test_id, read_request_body};
pub use response::{error_response, success_response};
pub use test_handlers::{append_test, get_test, health, list_tests, remove_test, replace_test};
