//! Live collection listeners
//!
//! A [`Subscription`] is the receiving half of a snapshot channel. Every item is
//! the full current contents of the collection, or the error that ended the
//! listener. Cancelling or dropping the handle stops delivery; writes already
//! sent to the store are unaffected.

use crate::document::Document;
use crate::error::StoreError;
use crate::path::CollectionPath;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// One listener emission
pub type SnapshotResult = Result<Vec<Document>, StoreError>;

/// Receiving half of a live listener
#[derive(Debug)]
pub struct Subscription {
    collection: CollectionPath,
    rx: mpsc::UnboundedReceiver<SnapshotResult>,
}

/// Sending half of a live listener, held by the store
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    collection: CollectionPath,
    tx: mpsc::UnboundedSender<SnapshotResult>,
}

impl Subscription {
    /// Create a connected sender/subscription pair
    #[must_use]
    pub fn channel(collection: CollectionPath) -> (SnapshotSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            SnapshotSender {
                collection: collection.clone(),
                tx,
            },
            Self { collection, rx },
        )
    }

    /// Collection being listened to
    #[inline]
    #[must_use]
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Wait for the next emission, `None` once the listener has ended
    pub async fn next_snapshot(&mut self) -> Option<SnapshotResult> {
        self.rx.recv().await
    }

    /// Stop future delivery
    ///
    /// Emissions already queued can still be drained.
    #[inline]
    pub fn cancel(&mut self) {
        self.rx.close();
    }
}

impl Stream for Subscription {
    type Item = SnapshotResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl SnapshotSender {
    /// Collection this sender feeds
    #[inline]
    #[must_use]
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Push a snapshot; `false` when the subscription is gone
    #[inline]
    pub fn emit(&self, snapshot: Vec<Document>) -> bool {
        self.tx.send(Ok(snapshot)).is_ok()
    }

    /// Terminate the subscription with an error
    #[inline]
    pub fn fail(self, reason: impl Into<String>) {
        let err = StoreError::subscription(&self.collection, reason);
        // Receiver may already be gone; nothing left to notify then.
        let _ = self.tx.send(Err(err));
    }

    /// Whether the receiving side has been cancelled or dropped
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
