//! In-process document store
//!
//! [`MemoryStore`] keeps documents ordered by path and pushes a full collection
//! snapshot to that collection's listeners after every committed write. An
//! optional access rule decides whether each write is allowed.

use crate::document::{Document, Fields, NewDocument, Query, Timestamp};
use crate::error::StoreError;
use crate::path::{CollectionPath, DocPath};
use crate::store::DocumentStore;
use crate::subscription::{SnapshotSender, Subscription};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use ulid::Ulid;

/// Kind of write presented to the access rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Create or overwrite at a known path
    Set,
    /// Create under a generated id
    Create,
    /// Partial update
    Update,
    /// Removal
    Delete,
}

/// Write presented to the access rule
#[derive(Debug)]
pub struct WriteRequest<'a> {
    /// Kind of write
    pub kind: WriteKind,
    /// Target document
    pub path: &'a DocPath,
    /// Incoming fields (absent for deletes)
    pub fields: Option<&'a Fields>,
}

/// Access rule: `Err(reason)` refuses the write
pub type AccessRule = Arc<dyn Fn(&WriteRequest<'_>) -> Result<(), String> + Send + Sync>;

/// In-memory [`DocumentStore`]
///
/// Cloning yields another handle to the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    docs: RwLock<BTreeMap<DocPath, Fields>>,
    listeners: DashMap<CollectionPath, Vec<SnapshotSender>>,
    rule: RwLock<Option<AccessRule>>,
}

impl MemoryStore {
    /// Create empty store that accepts every write
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty store guarded by an access rule
    #[must_use]
    pub fn with_rules(rule: AccessRule) -> Self {
        let store = Self::new();
        store.set_rules(Some(rule));
        store
    }

    /// Replace (or clear) the access rule
    pub fn set_rules(&self, rule: Option<AccessRule>) {
        *self.inner.rule.write() = rule;
    }

    /// Number of stored documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.docs.read().len()
    }

    /// Whether the store holds no documents
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.docs.read().is_empty()
    }

    /// Live listeners on a collection
    #[must_use]
    pub fn listener_count(&self, collection: &CollectionPath) -> usize {
        self.inner
            .listeners
            .get(collection)
            .map_or(0, |senders| senders.iter().filter(|s| !s.is_closed()).count())
    }

    /// Terminate every listener on `collection` with a subscription error
    pub fn interrupt_listeners(&self, collection: &CollectionPath, reason: &str) {
        if let Some((_, senders)) = self.inner.listeners.remove(collection) {
            tracing::warn!(%collection, reason, "interrupting {} listener(s)", senders.len());
            for sender in senders {
                sender.fail(reason);
            }
        }
    }

    fn check(&self, request: &WriteRequest<'_>) -> Result<(), StoreError> {
        let rule = self.inner.rule.read().clone();
        match rule {
            Some(rule) => rule(request).map_err(|reason| {
                tracing::debug!(path = %request.path, kind = ?request.kind, %reason, "write refused");
                StoreError::write_rejected(request.path, reason)
            }),
            None => Ok(()),
        }
    }

    fn snapshot(&self, collection: &CollectionPath) -> Vec<Document> {
        self.inner
            .docs
            .read()
            .iter()
            .filter(|(path, _)| collection.contains(path))
            .map(|(path, fields)| Document::new(path.clone(), fields.clone()))
            .collect()
    }

    fn notify(&self, collection: &CollectionPath) {
        let Some(mut senders) = self.inner.listeners.get_mut(collection) else {
            return;
        };
        let snapshot = self.snapshot(collection);
        senders.retain(|sender| sender.emit(snapshot.clone()));
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.len())
            .field("listened_collections", &self.inner.listeners.len())
            .field("has_rules", &self.inner.rule.read().is_some())
            .finish()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        Ok(self
            .inner
            .docs
            .read()
            .get(path)
            .map(|fields| Document::new(path.clone(), fields.clone())))
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        self.check(&WriteRequest {
            kind: WriteKind::Set,
            path,
            fields: Some(&fields),
        })?;
        self.inner.docs.write().insert(path.clone(), fields);
        self.notify(&path.parent());
        Ok(())
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        doc: NewDocument,
    ) -> Result<DocPath, StoreError> {
        let path = collection.doc(Ulid::new().to_string().to_lowercase())?;
        let NewDocument {
            mut fields,
            server_timestamps,
        } = doc;

        self.check(&WriteRequest {
            kind: WriteKind::Create,
            path: &path,
            fields: Some(&fields),
        })?;

        let stamp = Timestamp::now().to_value();
        for field in server_timestamps {
            fields.insert(field, stamp.clone());
        }

        self.inner.docs.write().insert(path.clone(), fields);
        tracing::debug!(%path, "document created");
        self.notify(collection);
        Ok(path)
    }

    async fn update(&self, path: &DocPath, changes: Fields) -> Result<(), StoreError> {
        self.check(&WriteRequest {
            kind: WriteKind::Update,
            path,
            fields: Some(&changes),
        })?;

        {
            let mut docs = self.inner.docs.write();
            let existing = docs
                .get_mut(path)
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            existing.extend(changes);
        }

        self.notify(&path.parent());
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        self.check(&WriteRequest {
            kind: WriteKind::Delete,
            path,
            fields: None,
        })?;

        let removed = self.inner.docs.write().remove(path).is_some();
        if removed {
            tracing::debug!(%path, "document deleted");
            self.notify(&path.parent());
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .snapshot(&query.collection)
            .into_iter()
            .filter(|doc| query.matches(doc))
            .collect())
    }

    fn listen(&self, collection: &CollectionPath) -> Subscription {
        let (sender, subscription) = Subscription::channel(collection.clone());
        let mut senders = self.inner.listeners.entry(collection.clone()).or_default();
        sender.emit(self.snapshot(collection));
        senders.push(sender);
        subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn path(raw: &str) -> DocPath {
        raw.parse().unwrap()
    }

    fn collection(raw: &str) -> CollectionPath {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store
            .set(&path("users/u1"), fields(json!({ "displayName": "Al" })))
            .await
            .unwrap();

        let doc = store.get(&path("users/u1")).await.unwrap().unwrap();
        assert_eq!(doc.get_str("displayName"), Some("Al"));
        assert!(store.get(&path("users/u2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_stamps_server_timestamp() {
        let store = MemoryStore::new();
        let comments = collection("works/w1/comments");
        let created = store
            .add(
                &comments,
                NewDocument::new(fields(json!({ "text": "hi" }))).with_server_timestamp("created"),
            )
            .await
            .unwrap();

        assert_eq!(created.parent(), comments);
        let doc = store.get(&created).await.unwrap().unwrap();
        let stamp: Timestamp = serde_json::from_value(doc.get("created").cloned().unwrap()).unwrap();
        assert!(stamp.seconds > 0);
    }

    #[tokio::test]
    async fn update_merges_and_requires_existing() {
        let store = MemoryStore::new();
        let p = path("works/w1/comments/c1");
        store
            .set(&p, fields(json!({ "owner": "u1", "text": "old" })))
            .await
            .unwrap();

        store
            .update(&p, fields(json!({ "text": "new" })))
            .await
            .unwrap();
        let doc = store.get(&p).await.unwrap().unwrap();
        assert_eq!(doc.get_str("text"), Some("new"));
        assert_eq!(doc.get_str("owner"), Some("u1"));

        let missing = store
            .update(&path("works/w1/comments/c9"), fields(json!({ "text": "x" })))
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let p = path("works/w1/comments/c1");
        store.set(&p, Fields::new()).await.unwrap();

        store.delete(&p).await.unwrap();
        store.delete(&p).await.unwrap();
        store.delete(&path("works/w1/comments/never")).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn rules_reject_writes() {
        let rule: AccessRule = Arc::new(|req: &WriteRequest<'_>| {
            if req.kind == WriteKind::Delete {
                Err("deletes disabled".to_string())
            } else {
                Ok(())
            }
        });
        let store = MemoryStore::with_rules(rule);
        let p = path("works/w1/comments/c1");
        store.set(&p, Fields::new()).await.unwrap();

        let err = store.delete(&p).await.unwrap_err();
        assert!(err.is_write_rejected());
        assert_eq!(store.len(), 1);

        store.set_rules(None);
        store.delete(&p).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn query_filters_by_field() {
        let store = MemoryStore::new();
        store
            .set(&path("works/w1"), fields(json!({ "owner": "u1" })))
            .await
            .unwrap();
        store
            .set(&path("works/w2"), fields(json!({ "owner": "u2" })))
            .await
            .unwrap();
        store
            .set(&path("works/w3"), fields(json!({ "owner": "u1" })))
            .await
            .unwrap();

        let found = store
            .query(&Query::new(collection("works")).where_eq("owner", "u1"))
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(Document::id).collect();
        assert_eq!(ids, vec!["w1", "w3"]);
    }

    #[tokio::test]
    async fn listener_gets_initial_and_subsequent_snapshots() {
        let store = MemoryStore::new();
        let comments = collection("works/w1/comments");
        store
            .set(&path("works/w1/comments/c1"), Fields::new())
            .await
            .unwrap();

        let mut sub = store.listen(&comments);
        let first = sub.next_snapshot().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        store
            .set(&path("works/w1/comments/c2"), Fields::new())
            .await
            .unwrap();
        // Writes elsewhere do not reach this listener.
        store
            .set(&path("works/w2/comments/c3"), Fields::new())
            .await
            .unwrap();
        store
            .delete(&path("works/w1/comments/c1"))
            .await
            .unwrap();

        let second = sub.next_snapshot().await.unwrap().unwrap();
        assert_eq!(second.len(), 2);
        let third = sub.next_snapshot().await.unwrap().unwrap();
        let ids: Vec<_> = third.iter().map(Document::id).collect();
        assert_eq!(ids, vec!["c2"]);
    }

    #[tokio::test]
    async fn cancelled_listeners_are_pruned() {
        let store = MemoryStore::new();
        let comments = collection("works/w1/comments");
        let mut sub = store.listen(&comments);
        assert_eq!(store.listener_count(&comments), 1);

        sub.cancel();
        assert_eq!(store.listener_count(&comments), 0);
        store
            .set(&path("works/w1/comments/c1"), Fields::new())
            .await
            .unwrap();
        assert!(store.inner.listeners.get(&comments).unwrap().is_empty());
    }

    #[tokio::test]
    async fn interrupt_ends_listener_with_error() {
        let store = MemoryStore::new();
        let comments = collection("works/w1/comments");
        let mut sub = store.listen(&comments);
        let _initial = sub.next_snapshot().await;

        store.interrupt_listeners(&comments, "connection lost");
        let err = sub.next_snapshot().await.unwrap().unwrap_err();
        assert!(matches!(err, StoreError::Subscription { .. }));
        assert!(sub.next_snapshot().await.is_none());
    }
}
