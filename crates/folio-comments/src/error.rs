//! Error types for the comments layer

use folio_store::{DocPath, StoreError};

/// Comments layer error
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    /// Underlying store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Document exists but cannot be read as the expected record
    #[error("malformed document {path}: {reason}")]
    Malformed { path: String, reason: String },
}

impl CommentError {
    /// Create malformed-document error
    pub fn malformed(path: &DocPath, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_is_transparent() {
        let err: CommentError = StoreError::NotFound("users/u1".into()).into();
        assert_eq!(err.to_string(), "document not found: users/u1");
    }

    #[test]
    fn malformed_names_path() {
        let path: DocPath = "works/w1/comments/c1".parse().unwrap();
        let err = CommentError::malformed(&path, "missing owner");
        assert_eq!(
            err.to_string(),
            "malformed document works/w1/comments/c1: missing owner"
        );
    }
}
