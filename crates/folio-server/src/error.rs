//! Error types for the server side

use folio_store::{PathError, StoreError};
use std::path::PathBuf;
use thiserror::Error;

/// Server credential configuration problem; fatal at startup
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable absent or blank
    #[error("required environment variable {key} is not set")]
    Missing {
        /// Variable name
        key: &'static str,
    },

    /// Variable present but unusable
    #[error("environment variable {key} is invalid: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// What is wrong with the value
        reason: String,
    },
}

/// Failure creating the privileged store handle
#[derive(Debug, Error)]
pub enum InitError {
    /// An app with this name already exists (e.g. a hot-reload re-entry)
    #[error("store app '{name}' is already initialized")]
    DuplicateApp {
        /// App name already registered
        name: String,
    },

    /// The connector could not open the store
    #[error("failed to connect to store project '{project_id}': {reason}")]
    Connect {
        /// Project the credential belongs to
        project_id: String,
        /// Connector's explanation
        reason: String,
    },
}

impl InitError {
    /// Whether the error only reports a repeated initialization
    #[inline]
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateApp { .. })
    }
}

/// Failure of a server-side join
#[derive(Debug, Error)]
pub enum AccessError {
    /// A document the join starts from does not exist
    #[error("document not found: {path}")]
    NotFound {
        /// Path that was read
        path: String,
    },

    /// A document lacks the field the join follows
    #[error("document {path} has no '{field}' field")]
    MissingField {
        /// Document path
        path: String,
        /// Missing field name
        field: &'static str,
    },

    /// Store failure or invalid id
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PathError> for AccessError {
    fn from(e: PathError) -> Self {
        Self::Store(StoreError::InvalidPath(e))
    }
}

impl AccessError {
    /// Whether a referenced document was absent
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Store(e) => e.is_not_found(),
            Self::MissingField { .. } => false,
        }
    }
}

/// Failure loading a fixture file into a store
#[derive(Debug, Error)]
pub enum SeedError {
    /// Fixture file unreadable
    #[error("failed to read fixture {}: {source}", path.display())]
    Io {
        /// Fixture file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Fixture is not a JSON object
    #[error("fixture is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Entry body is not an object
    #[error("fixture entry '{key}' must map a document path to an object")]
    NotAnObject {
        /// Offending key
        key: String,
    },

    /// Entry key is not a document path
    #[error("fixture key '{key}' is not a document path: {source}")]
    InvalidPath {
        /// Offending key
        key: String,
        /// Why the path was rejected
        #[source]
        source: PathError,
    },

    /// Write failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_key() {
        let err = ConfigError::Missing {
            key: "STORE_PROJECT_ID",
        };
        assert_eq!(
            err.to_string(),
            "required environment variable STORE_PROJECT_ID is not set"
        );
    }

    #[test]
    fn duplicate_app_is_recognised() {
        assert!(InitError::DuplicateApp {
            name: "[DEFAULT]".into()
        }
        .is_duplicate());
        assert!(!InitError::Connect {
            project_id: "p".into(),
            reason: "refused".into()
        }
        .is_duplicate());
    }

    #[test]
    fn not_found_through_store() {
        let err = AccessError::from(StoreError::NotFound("works/w1".into()));
        assert!(err.is_not_found());
        assert!(AccessError::NotFound {
            path: "works/w1".into()
        }
        .is_not_found());
    }
}
