//! Data access layer
//!
//! Translates comment operations into store calls:
//! - live comment feed per work
//! - cached author profile reads
//! - text updates, deletes and creation of single comments

use crate::config::CommentsConfig;
use crate::error::CommentError;
use crate::layout;
use crate::model::{Comment, CommentId, UserId, UserProfile, WorkId};
use folio_store::{Document, DocumentStore, Fields, NewDocument, StoreError, Subscription};
use futures::{Stream, StreamExt};
use moka::future::Cache;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

/// Comment operations over a shared store handle
#[derive(Clone)]
pub struct CommentsDb {
    store: Arc<dyn DocumentStore>,
    users: Cache<UserId, UserProfile>,
}

impl CommentsDb {
    /// Create with default configuration
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, &CommentsConfig::default())
    }

    /// Create with explicit configuration
    #[must_use]
    pub fn with_config(store: Arc<dyn DocumentStore>, config: &CommentsConfig) -> Self {
        Self {
            store,
            users: Cache::builder()
                .max_capacity(config.user_cache_capacity)
                .time_to_live(config.user_cache_ttl())
                .build(),
        }
    }

    /// Underlying store handle
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Live feed of a work's comments
    ///
    /// Each item is the full current comment set. Failures arrive as a stream
    /// error and end the feed; nothing is retried here.
    ///
    /// # Errors
    /// `StoreError::InvalidPath` if the work id is not a valid path segment
    pub fn subscribe_comments(&self, work_id: &WorkId) -> Result<CommentFeed, StoreError> {
        let collection = layout::comments(work_id)?;
        tracing::debug!(%work_id, "subscribing to comments");
        Ok(CommentFeed::new(
            work_id.clone(),
            self.store.listen(&collection),
        ))
    }

    /// Author profile, `None` when no such user exists
    ///
    /// Found profiles are served from cache until their TTL lapses; misses
    /// are not cached.
    ///
    /// # Errors
    /// Store failures, or `CommentError::Malformed` for an unreadable profile
    pub async fn fetch_user(&self, user_id: &UserId) -> Result<Option<UserProfile>, CommentError> {
        if let Some(profile) = self.users.get(user_id).await {
            return Ok(Some(profile));
        }

        let path = layout::user(user_id).map_err(StoreError::from)?;
        let Some(doc) = self.store.get(&path).await? else {
            tracing::debug!(%user_id, "user not found");
            return Ok(None);
        };

        let profile = UserProfile::from_document(&doc)?;
        self.users.insert(user_id.clone(), profile.clone()).await;
        Ok(Some(profile))
    }

    /// Drop a cached profile so the next read goes to the store
    pub async fn invalidate_user(&self, user_id: &UserId) {
        self.users.invalidate(user_id).await;
    }

    /// Replace a comment's text
    ///
    /// # Errors
    /// `StoreError::NotFound` if the comment is gone, `WriteRejected` if the
    /// store refuses the write
    pub async fn update_comment_text(
        &self,
        work_id: &WorkId,
        comment_id: &CommentId,
        text: &str,
    ) -> Result<(), StoreError> {
        let path = layout::comment(work_id, comment_id)?;
        let mut changes = Fields::new();
        changes.insert(layout::TEXT_FIELD.to_string(), Value::String(text.to_string()));
        self.store.update(&path, changes).await
    }

    /// Delete a comment; deleting an absent comment succeeds
    ///
    /// # Errors
    /// `StoreError::WriteRejected` if the store refuses the write
    pub async fn delete_comment(
        &self,
        work_id: &WorkId,
        comment_id: &CommentId,
    ) -> Result<(), StoreError> {
        let path = layout::comment(work_id, comment_id)?;
        self.store.delete(&path).await
    }

    /// Post a new comment; the store assigns its id and creation time
    ///
    /// # Errors
    /// `StoreError::WriteRejected` if the store refuses the write
    pub async fn create_comment(
        &self,
        work_id: &WorkId,
        owner: &UserId,
        text: &str,
    ) -> Result<CommentId, StoreError> {
        let collection = layout::comments(work_id)?;
        let mut fields = Fields::new();
        fields.insert(
            layout::OWNER_FIELD.to_string(),
            Value::String(owner.to_string()),
        );
        fields.insert(layout::TEXT_FIELD.to_string(), Value::String(text.to_string()));

        let path = self
            .store
            .add(
                &collection,
                NewDocument::new(fields).with_server_timestamp(layout::CREATED_FIELD),
            )
            .await?;
        tracing::info!(%work_id, %path, "comment created");
        Ok(CommentId::new(path.id()))
    }
}

impl fmt::Debug for CommentsDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentsDb")
            .field("cached_users", &self.users.entry_count())
            .finish_non_exhaustive()
    }
}

/// Live comment set for one work
///
/// Dropping or cancelling the feed stops delivery.
#[derive(Debug)]
pub struct CommentFeed {
    work_id: WorkId,
    inner: Subscription,
}

impl CommentFeed {
    /// Wrap a raw subscription on `works/{work_id}/comments`
    #[inline]
    #[must_use]
    pub fn new(work_id: WorkId, inner: Subscription) -> Self {
        Self { work_id, inner }
    }

    /// Work whose comments this feed carries
    #[inline]
    #[must_use]
    pub fn work_id(&self) -> &WorkId {
        &self.work_id
    }

    /// Wait for the next comment set, `None` once the feed has ended
    pub async fn next_comments(&mut self) -> Option<Result<Vec<Comment>, StoreError>> {
        self.next().await
    }

    /// Stop future delivery
    #[inline]
    pub fn cancel(&mut self) {
        self.inner.cancel();
    }
}

impl Stream for CommentFeed {
    type Item = Result<Vec<Comment>, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let item = ready!(Pin::new(&mut self.inner).poll_next(cx));
        Poll::Ready(item.map(|snapshot| snapshot.map(|docs| decode_comments(&self.work_id, &docs))))
    }
}

/// Decode a snapshot, oldest first; pending timestamps sort last
fn decode_comments(work_id: &WorkId, docs: &[Document]) -> Vec<Comment> {
    let mut comments: Vec<Comment> = docs
        .iter()
        .filter_map(|doc| match Comment::from_document(work_id, doc) {
            Ok(comment) => Some(comment),
            Err(e) => {
                tracing::warn!(%work_id, error = %e, "skipping unreadable comment");
                None
            }
        })
        .collect();
    comments.sort_by(|a, b| {
        (a.created.is_none(), a.created, &a.id).cmp(&(b.created.is_none(), b.created, &b.id))
    });
    comments
}
