//! Documents, server timestamps and queries

use crate::error::StoreError;
use crate::path::{CollectionPath, DocPath};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schemaless document body
pub type Fields = serde_json::Map<String, Value>;

/// A stored document: its path plus its fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Where the document lives
    pub path: DocPath,
    /// Document body
    pub fields: Fields,
}

impl Document {
    /// Create document
    #[inline]
    #[must_use]
    pub fn new(path: DocPath, fields: Fields) -> Self {
        Self { path, fields }
    }

    /// Document id (last path segment)
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Raw field value
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String field value, `None` when absent or not a string
    #[inline]
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Decode the whole body into a typed value
    ///
    /// # Errors
    /// Returns `StoreError::Decode` when the body does not match `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|source| {
            StoreError::Decode {
                path: self.path.to_string(),
                source,
            }
        })
    }

    /// Consume into the field map
    #[inline]
    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

/// Store-native timestamp (seconds since the Unix epoch plus nanos)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Whole seconds
    pub seconds: i64,
    /// Sub-second nanoseconds
    #[serde(default)]
    pub nanos: u32,
}

impl Timestamp {
    /// Timestamp from whole seconds
    #[inline]
    #[must_use]
    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Current wall-clock time
    #[must_use]
    pub fn now() -> Self {
        let now = chrono::Utc::now();
        Self {
            seconds: now.timestamp(),
            nanos: now.timestamp_subsec_nanos(),
        }
    }

    /// Milliseconds since the Unix epoch, `None` if that overflows `i64`
    #[inline]
    #[must_use]
    pub fn to_millis(&self) -> Option<i64> {
        self.seconds
            .checked_mul(1000)?
            .checked_add(i64::from(self.nanos / 1_000_000))
    }

    /// JSON form stored in document fields
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "seconds": self.seconds, "nanos": self.nanos })
    }
}

/// Document to be created by the store under a generated id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDocument {
    /// Client-supplied fields
    pub fields: Fields,
    /// Fields the store fills with its own commit timestamp
    pub server_timestamps: Vec<String>,
}

impl NewDocument {
    /// Create from fields
    #[inline]
    #[must_use]
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    /// Ask the store to stamp `field` at commit time
    #[inline]
    #[must_use]
    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }
}

/// Equality filter on a single field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field name
    pub field: String,
    /// Value the field must equal
    pub value: Value,
}

/// Collection query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection to scan
    pub collection: CollectionPath,
    /// All filters must match
    pub filters: Vec<Filter>,
}

impl Query {
    /// Query every document in a collection
    #[inline]
    #[must_use]
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
        }
    }

    /// Add `field == value`
    #[inline]
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Whether a document satisfies this query
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.collection.contains(&doc.path)
            && self
                .filters
                .iter()
                .all(|f| doc.get(&f.field) == Some(&f.value))
    }
}
