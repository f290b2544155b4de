//! Error types for the document store
//!
//! Covers:
//! - Missing documents on reads and partial updates
//! - Writes refused by the store's access rules
//! - Live listeners terminating abnormally
//! - Malformed paths and document bodies

use crate::path::PathError;

/// Document store error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Referenced document does not exist
    #[error("document not found: {0}")]
    NotFound(String),

    /// Store refused the write
    #[error("write rejected on {path}: {reason}")]
    WriteRejected { path: String, reason: String },

    /// Live listener ended abnormally
    #[error("subscription on {collection} terminated: {reason}")]
    Subscription { collection: String, reason: String },

    /// Malformed path
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Document body does not match the expected shape
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create write-rejected error
    pub fn write_rejected(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::WriteRejected {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Create subscription error
    pub fn subscription(collection: impl ToString, reason: impl Into<String>) -> Self {
        Self::Subscription {
            collection: collection.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if error is a missing document
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if error is a refused write
    #[inline]
    #[must_use]
    pub fn is_write_rejected(&self) -> bool {
        matches!(self, Self::WriteRejected { .. })
    }
}
