//! Domain types for work comments
//!
//! - Typed identifiers for works, comments and users
//! - [`Comment`], decoded from a comment document
//! - [`UserProfile`], the read-only author record

use crate::error::CommentError;
use folio_store::{Document, Timestamp};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow as string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id!(
    /// Work (portfolio piece) identifier
    WorkId
);
string_id!(
    /// Comment identifier, unique within a work
    CommentId
);
string_id!(
    /// User identifier
    UserId
);

/// A comment attached to a work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id (document id)
    pub id: CommentId,
    /// Owning work
    pub work_id: WorkId,
    /// Author
    pub owner: UserId,
    /// Body text
    pub text: String,
    /// Server-assigned creation time; absent until the store commits it
    pub created: Option<Timestamp>,
}

#[derive(Deserialize)]
struct CommentBody {
    owner: UserId,
    #[serde(default)]
    text: String,
    #[serde(default)]
    created: Option<Timestamp>,
}

impl Comment {
    /// Decode a document from `works/{work}/comments/{id}`
    ///
    /// # Errors
    /// `CommentError::Malformed` when the document lacks an owner or carries
    /// fields of the wrong type
    pub fn from_document(work_id: &WorkId, doc: &Document) -> Result<Self, CommentError> {
        let body: CommentBody = doc
            .decode()
            .map_err(|e| CommentError::malformed(&doc.path, e.to_string()))?;
        Ok(Self {
            id: CommentId::new(doc.id()),
            work_id: work_id.clone(),
            owner: body.owner,
            text: body.text,
            created: body.created,
        })
    }

    /// Creation time in milliseconds since the epoch
    #[inline]
    #[must_use]
    pub fn created_millis(&self) -> Option<i64> {
        self.created.and_then(|ts| ts.to_millis())
    }
}

/// Author profile stored at `users/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id (document id)
    #[serde(skip)]
    pub id: UserId,
    /// Name shown next to comments
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    /// Avatar URL
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
}

impl UserProfile {
    /// Decode a document from `users/{id}`
    ///
    /// # Errors
    /// `CommentError::Malformed` when fields carry the wrong type
    pub fn from_document(doc: &Document) -> Result<Self, CommentError> {
        let mut profile: Self = doc
            .decode()
            .map_err(|e| CommentError::malformed(&doc.path, e.to_string()))?;
        profile.id = UserId::new(doc.id());
        Ok(profile)
    }
}
