//! Document model
//!
//! Documents are JSON objects addressed by `(collection, id)`. The id is not
//! part of the stored fields. Every committed write stamps the document with
//! the store-wide commit version; transactions use that version as their
//! optimistic-concurrency token.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stored field map of a document
pub type Fields = Map<String, Value>;

/// Totally ordered commit version.
///
/// Assigned once per commit, strictly increasing, never reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A document as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub fields: Fields,
    pub version: Version,
}

impl DocumentSnapshot {
    /// Look up a single field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Equality predicate for `DocumentStore::find`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// A missing field never matches, not even a `null` filter value.
    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

/// A single staged write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or replace the whole document
    Set {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merge fields into an existing document; fails if it does not exist
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
}

impl WriteOp {
    pub fn target(&self) -> (&str, &str) {
        match self {
            WriteOp::Set { collection, id, .. } | WriteOp::Update { collection, id, .. } => {
                (collection, id)
            }
        }
    }
}

/// Version a document must still have at commit time.
///
/// `expected: None` means the document must still be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub collection: String,
    pub id: String,
    pub expected: Option<Version>,
}

/// Everything a commit applies, atomically, or not at all
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitRequest {
    pub preconditions: Vec<Precondition>,
    pub writes: Vec<WriteOp>,
}

impl CommitRequest {
    /// A commit with one write and no preconditions
    pub fn single(write: WriteOp) -> Self {
        Self {
            preconditions: Vec::new(),
            writes: vec![write],
        }
    }
}
