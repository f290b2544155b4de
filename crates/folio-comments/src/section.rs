//! Comment list view
//!
//! [`CommentSection`] listens to one work's comments and keeps one
//! [`CommentRow`] per comment. Rows are matched by comment id across
//! emissions, so a row that is mid-edit keeps its controller (and its editor
//! contents) while the list around it changes.

use crate::db::{CommentFeed, CommentsDb};
use crate::model::{Comment, CommentId, WorkId};
use crate::row::{CommentRow, RowView};
use folio_store::StoreError;
use futures::future::join_all;
use indexmap::IndexMap;
use std::sync::Arc;

/// Live list of a work's comments
#[derive(Debug)]
pub struct CommentSection {
    db: Arc<CommentsDb>,
    work_id: Option<WorkId>,
    feed: Option<CommentFeed>,
    rows: IndexMap<CommentId, Arc<CommentRow>>,
}

impl CommentSection {
    /// Create an unmounted section
    #[must_use]
    pub fn new(db: Arc<CommentsDb>) -> Self {
        Self {
            db,
            work_id: None,
            feed: None,
            rows: IndexMap::new(),
        }
    }

    /// Work currently shown
    #[inline]
    #[must_use]
    pub fn work_id(&self) -> Option<&WorkId> {
        self.work_id.as_ref()
    }

    /// Whether a feed is attached and still running
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.feed.is_some()
    }

    /// Start listening to `work_id`
    ///
    /// Mounting the work already being listened to does nothing. Switching
    /// works tears down the old listener and drops every row.
    ///
    /// # Errors
    /// `StoreError::InvalidPath` if the work id is not a valid path segment
    pub fn mount(&mut self, work_id: WorkId) -> Result<(), StoreError> {
        if self.is_live() && self.work_id.as_ref() == Some(&work_id) {
            return Ok(());
        }
        let feed = self.db.subscribe_comments(&work_id)?;
        self.attach(work_id, feed);
        Ok(())
    }

    /// Listen through an already-built feed
    pub fn attach(&mut self, work_id: WorkId, feed: CommentFeed) {
        self.stop_feed();
        if self.work_id.as_ref() != Some(&work_id) {
            self.rows.clear();
        }
        tracing::debug!(%work_id, "comment section mounted");
        self.work_id = Some(work_id);
        self.feed = Some(feed);
    }

    /// Stop listening and drop every row
    ///
    /// Mutations rows already sent to the store still complete.
    pub fn unmount(&mut self) {
        self.stop_feed();
        self.rows.clear();
        self.work_id = None;
    }

    fn stop_feed(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            tracing::debug!(work_id = %feed.work_id(), "comment feed cancelled");
            feed.cancel();
        }
    }

    /// Wait for one emission and reconcile rows against it
    ///
    /// Returns the row count after reconciling, the error that ended the
    /// feed, or `None` when no feed is running.
    pub async fn next_update(&mut self) -> Option<Result<usize, StoreError>> {
        let feed = self.feed.as_mut()?;
        match feed.next_comments().await {
            Some(Ok(comments)) => {
                self.apply(comments);
                Some(Ok(self.rows.len()))
            }
            Some(Err(e)) => {
                tracing::error!(work_id = ?self.work_id, error = %e, "comment feed terminated");
                self.feed = None;
                Some(Err(e))
            }
            None => {
                self.feed = None;
                None
            }
        }
    }

    /// Reconcile until the feed ends
    ///
    /// # Errors
    /// The error that terminated the feed; it is not retried
    pub async fn run(&mut self) -> Result<(), StoreError> {
        while let Some(update) = self.next_update().await {
            update?;
        }
        Ok(())
    }

    /// Replace the row set with `comments`, reusing rows by id
    pub fn apply(&mut self, comments: Vec<Comment>) {
        let mut next = IndexMap::with_capacity(comments.len());
        for comment in comments {
            let id = comment.id.clone();
            let row = match self.rows.swap_remove(&id) {
                Some(row) => {
                    row.refresh(comment);
                    row
                }
                None => Arc::new(CommentRow::new(Arc::clone(&self.db), comment)),
            };
            next.insert(id, row);
        }

        if !self.rows.is_empty() {
            tracing::debug!(discarded = self.rows.len(), "dropping rows for removed comments");
        }
        self.rows = next;
    }

    /// Fetch author profiles for rows that have none yet
    pub async fn load_authors(&self) {
        let missing: Vec<_> = self
            .rows
            .values()
            .filter(|row| row.author().is_none())
            .cloned()
            .collect();
        join_all(missing.iter().map(|row| row.load_author())).await;
    }

    /// Rows in display order
    pub fn rows(&self) -> impl Iterator<Item = &Arc<CommentRow>> {
        self.rows.values()
    }

    /// Row for a comment
    #[must_use]
    pub fn row(&self, id: &CommentId) -> Option<Arc<CommentRow>> {
        self.rows.get(id).cloned()
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render every row
    #[must_use]
    pub fn view(&self) -> Vec<RowView> {
        self.rows.values().map(|row| row.view()).collect()
    }
}
