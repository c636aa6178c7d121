//! Integration tests for the test repository.
//!
//! 1. Document round-trip and CRUD behavior
//! 2. Concurrent writers and readers

pub mod concurrency_tests;
pub mod crud_tests;
pub mod helpers;
