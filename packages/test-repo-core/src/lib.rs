//! Flat-file storage engine for writing-test records.
//!
//! Provides the document codec, atomic persistence, a per-document lock
//! registry, and the CRUD operations of the test repository.

pub mod config;
pub mod document;
pub mod error;
pub mod persistence;
pub mod repository;

pub use config::{DeletePolicy, IdAllocation, StoreConfig};
pub use document::{TestDocument, TestRecord};
pub use error::RepoError;
pub use repository::{TestRepository, TestStore};
