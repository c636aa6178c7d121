//! Test document model and JSON codec.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One writing test.
///
/// Only `test_id` is interpreted; every other attribute is carried verbatim,
/// in its original key order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestRecord {
    /// Unique id within the document, `None` until the store assigns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<u64>,
    /// Opaque test content
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl TestRecord {
    /// Creates a record from its attributes with no id.
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            test_id: None,
            attributes,
        }
    }

    /// Creates a record with an explicit id.
    pub fn with_id(test_id: u64, attributes: Map<String, Value>) -> Self {
        Self {
            test_id: Some(test_id),
            attributes,
        }
    }

    /// Parses a record from a JSON value such as a request body.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Persisted root: the ordered test list plus opaque metadata.
///
/// Metadata keys keep their order; `tests` is written first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestDocument {
    /// Records in insertion order
    pub tests: Vec<TestRecord>,
    /// Document-level fields passed through unmodified
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl TestDocument {
    /// Decodes and validates a persisted document.
    ///
    /// Every stored record must carry a `test_id`, and ids must be unique.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, String> {
        let document: TestDocument = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

        let mut seen = HashSet::with_capacity(document.tests.len());
        for (position, record) in document.tests.iter().enumerate() {
            let test_id = record
                .test_id
                .ok_or_else(|| format!("record at position {} has no test_id", position))?;
            if !seen.insert(test_id) {
                return Err(format!(
                    "test_id {} appears more than once (position {})",
                    test_id, position
                ));
            }
        }

        Ok(document)
    }

    /// Encodes the document as JSON bytes.
    pub fn to_vec(&self, pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
        if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        }
    }

    /// Largest id in the document, if any record exists.
    pub fn max_test_id(&self) -> Option<u64> {
        self.tests.iter().filter_map(|r| r.test_id).max()
    }

    /// Position of the record with the given id.
    pub fn position_of(&self, test_id: u64) -> Option<usize> {
        self.tests.iter().position(|r| r.test_id == Some(test_id))
    }

    /// Record with the given id.
    pub fn find(&self, test_id: u64) -> Option<&TestRecord> {
        self.tests.iter().find(|r| r.test_id == Some(test_id))
    }

    pub fn contains(&self, test_id: u64) -> bool {
        self.find(test_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
