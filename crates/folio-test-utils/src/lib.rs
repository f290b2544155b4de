//! Testing utilities for Folio workspace
//!
//! Shared fixtures plus [`RecordingStore`], a store wrapper that records every
//! call and can hold mutations in flight until a test releases them.

#![allow(missing_docs)]

use async_trait::async_trait;
use folio_store::{
    CollectionPath, DocPath, Document, DocumentStore, Fields, MemoryStore, NewDocument, Query,
    StoreError, Subscription, Timestamp,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Get(String),
    Set(String),
    Add(String),
    Update { path: String, fields: Fields },
    Delete(String),
    Query(String),
    Listen(String),
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Set(_) | Self::Add(_) | Self::Update { .. } | Self::Delete(_)
        )
    }
}

/// Wraps a [`MemoryStore`]; updates and deletes optionally wait on a gate
#[derive(Debug)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
    gate: Option<Arc<Semaphore>>,
    entered: Notify,
}

impl RecordingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            gate: None,
            entered: Notify::new(),
        }
    }

    /// Updates and deletes block until [`RecordingStore::release`] is called
    pub fn gated(inner: MemoryStore) -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new(inner)
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    /// Let `n` held mutations proceed
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Resolves once a gated mutation has reached the store
    pub async fn mutation_started(&self) {
        self.entered.notified().await;
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }

    async fn hold(&self) {
        if let Some(gate) = &self.gate {
            self.entered.notify_one();
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        self.record(StoreCall::Get(path.to_string()));
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        self.record(StoreCall::Set(path.to_string()));
        self.inner.set(path, fields).await
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        doc: NewDocument,
    ) -> Result<DocPath, StoreError> {
        self.record(StoreCall::Add(collection.to_string()));
        self.inner.add(collection, doc).await
    }

    async fn update(&self, path: &DocPath, changes: Fields) -> Result<(), StoreError> {
        self.record(StoreCall::Update {
            path: path.to_string(),
            fields: changes.clone(),
        });
        self.hold().await;
        self.inner.update(path, changes).await
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        self.record(StoreCall::Delete(path.to_string()));
        self.hold().await;
        self.inner.delete(path).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.record(StoreCall::Query(query.collection.to_string()));
        self.inner.query(query).await
    }

    fn listen(&self, collection: &CollectionPath) -> Subscription {
        self.record(StoreCall::Listen(collection.to_string()));
        self.inner.listen(collection)
    }
}

pub fn object(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be a JSON object, got {other}"),
    }
}

pub fn comment_fields(owner: &str, text: &str, created_secs: i64) -> Fields {
    object(json!({
        "owner": owner,
        "text": text,
        "created": Timestamp::from_seconds(created_secs).to_value(),
    }))
}

pub fn comment_path(work_id: &str, comment_id: &str) -> DocPath {
    format!("works/{work_id}/comments/{comment_id}")
        .parse()
        .unwrap()
}

pub async fn seed_comment(
    store: &MemoryStore,
    work_id: &str,
    comment_id: &str,
    owner: &str,
    text: &str,
    created_secs: i64,
) {
    store
        .set(
            &comment_path(work_id, comment_id),
            comment_fields(owner, text, created_secs),
        )
        .await
        .unwrap();
}

pub async fn seed_user(store: &MemoryStore, user_id: &str, display_name: &str) {
    let path: DocPath = format!("users/{user_id}").parse().unwrap();
    store
        .set(
            &path,
            object(json!({
                "displayName": display_name,
                "photoURL": format!("https://img.example/{user_id}.png"),
            })),
        )
        .await
        .unwrap();
}

pub async fn seed_work(store: &MemoryStore, work_id: &str, owner: &str, title: &str) {
    let path: DocPath = format!("works/{work_id}").parse().unwrap();
    store
        .set(&path, object(json!({ "owner": owner, "title": title })))
        .await
        .unwrap();
}

/// Store fixture: work `w1` by `u1` with comments `c1` and `c2`
pub async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    seed_user(&store, "u1", "Al").await;
    seed_user(&store, "u2", "Bo").await;
    seed_work(&store, "w1", "u1", "T").await;
    seed_comment(&store, "w1", "c1", "u1", "first", 100).await;
    seed_comment(&store, "w1", "c2", "u2", "second", 200).await;
    store
}
