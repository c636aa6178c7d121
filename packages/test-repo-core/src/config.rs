//! Repository configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::RepoError;

/// How `append` picks a test id when the caller leaves it unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdAllocation {
    /// `max(existing ids, 0) + 1`. Ids freed by deletion at the top of the
    /// range can be issued again.
    #[default]
    MaxPlusOne,
    /// Like `MaxPlusOne`, but also above every id ever issued. The high-water
    /// mark is persisted in the document under [`HIGH_WATER_MARK_KEY`].
    Monotonic,
}

/// What `remove` does when no record matches the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Succeeds and rewrites the document unchanged.
    #[default]
    Lenient,
    /// Fails with `RecordNotFound` and writes nothing.
    Strict,
}

/// Document metadata key holding the last id issued under
/// [`IdAllocation::Monotonic`].
pub const HIGH_WATER_MARK_KEY: &str = "last_test_id";

/// Repository configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the default document and named collections
    pub data_dir: PathBuf,
    /// File name of the default document inside `data_dir`
    pub document_name: String,
    /// Id allocation strategy for appends without an id
    pub id_allocation: IdAllocation,
    /// Behavior when removing an absent id
    pub delete_policy: DeletePolicy,
    /// Treat a missing document as `{"tests": []}` instead of failing
    pub create_if_missing: bool,
    /// Write indented JSON
    pub pretty: bool,
    /// Maximum wait for the document lock in milliseconds (0 = wait forever)
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            document_name: "writing-tests.json".to_string(),
            id_allocation: IdAllocation::MaxPlusOne,
            delete_policy: DeletePolicy::Lenient,
            create_if_missing: false,
            pretty: true,
            lock_timeout_ms: 0,
        }
    }
}

impl StoreConfig {
    /// Path of the default document.
    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(&self.document_name)
    }

    /// Path of a named collection document, `<data_dir>/<name>.json`.
    ///
    /// Names are limited to ASCII letters, digits, `-` and `_` so they can
    /// never escape `data_dir`.
    pub fn collection_path(&self, name: &str) -> Result<PathBuf, RepoError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RepoError::InvalidRequest(format!(
                "Invalid collection name '{}'",
                name
            )));
        }
        Ok(self.data_dir.join(format!("{}.json", name)))
    }
}

impl FromStr for IdAllocation {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max-plus-one" | "max" => Ok(IdAllocation::MaxPlusOne),
            "monotonic" => Ok(IdAllocation::Monotonic),
            other => Err(RepoError::InvalidRequest(format!(
                "Unknown id allocation '{}' (expected max-plus-one or monotonic)",
                other
            ))),
        }
    }
}

impl fmt::Display for IdAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdAllocation::MaxPlusOne => write!(f, "max-plus-one"),
            IdAllocation::Monotonic => write!(f, "monotonic"),
        }
    }
}

impl FromStr for DeletePolicy {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(DeletePolicy::Lenient),
            "strict" => Ok(DeletePolicy::Strict),
            other => Err(RepoError::InvalidRequest(format!(
                "Unknown delete policy '{}' (expected lenient or strict)",
                other
            ))),
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicy::Lenient => write!(f, "lenient"),
            DeletePolicy::Strict => write!(f, "strict"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_path_rejects_traversal() {
        let config = StoreConfig::default();
        assert!(config.collection_path("reading_2024-a").is_ok());
        assert!(config.collection_path("../etc/passwd").is_err());
        assert!(config.collection_path("a/b").is_err());
        assert!(config.collection_path("").is_err());
    }

    #[test]
    fn test_parse_policies() {
        assert_eq!(
            "monotonic".parse::<IdAllocation>().unwrap(),
            IdAllocation::Monotonic
        );
        assert_eq!(
            "MAX".parse::<IdAllocation>().unwrap(),
            IdAllocation::MaxPlusOne
        );
        assert_eq!(
            "strict".parse::<DeletePolicy>().unwrap(),
            DeletePolicy::Strict
        );
        assert!("sometimes".parse::<DeletePolicy>().is_err());
        assert_eq!(DeletePolicy::Lenient.to_string(), "lenient");
    }
}
