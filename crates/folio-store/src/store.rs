//! The document store seam

use crate::document::{Document, Fields, NewDocument, Query};
use crate::error::StoreError;
use crate::path::{CollectionPath, DocPath};
use crate::subscription::Subscription;
use async_trait::async_trait;

/// Hosted document database: per-document CRUD, collection queries and live
/// listeners
///
/// The store is the sole arbiter of write ordering; callers hold no locks
/// around these calls and two writers racing on one document resolve as
/// last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read, `None` when the document does not exist
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// Create or overwrite a document
    async fn set(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError>;

    /// Create a document under a store-generated id
    async fn add(&self, collection: &CollectionPath, doc: NewDocument)
        -> Result<DocPath, StoreError>;

    /// Merge `changes` into an existing document
    ///
    /// # Errors
    /// `StoreError::NotFound` when the document no longer exists
    async fn update(&self, path: &DocPath, changes: Fields) -> Result<(), StoreError>;

    /// Remove a document; removing an absent document succeeds
    async fn delete(&self, path: &DocPath) -> Result<(), StoreError>;

    /// Documents matching a query, ordered by path
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Start a live listener on a collection
    ///
    /// The first emission is the current contents; each later one follows a
    /// committed write.
    fn listen(&self, collection: &CollectionPath) -> Subscription;
}
