//! Server-side joins
//!
//! Each join is two independent reads. Nothing ties them together, so the
//! second read can observe writes made after the first.

use crate::admin::AdminApp;
use crate::error::AccessError;
use folio_comments::layout::{self, OWNER_FIELD};
use folio_comments::{UserId, WorkId};
use folio_store::{DocPath, Document, DocumentStore, Fields, Query};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// Key holding the owner's profile in [`WorkDetails`]
pub const OWNER_DATA_KEY: &str = "ownerData";
/// Key holding the owned works in [`DevDetails`]
pub const WORKS_KEY: &str = "works";

/// A work's fields joined with its owner's profile
///
/// Serializes as `{ ..work, "ownerData": { ..profile } }`. `ownerData` is
/// omitted when the owner has no profile document.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkDetails {
    /// Work document fields
    pub work: Fields,
    /// Owner's profile fields, if the profile exists
    pub owner_data: Option<Fields>,
}

impl Serialize for WorkDetails {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.work.iter().filter(|(k, _)| *k != OWNER_DATA_KEY) {
            map.serialize_entry(key, value)?;
        }
        if let Some(owner) = &self.owner_data {
            map.serialize_entry(OWNER_DATA_KEY, owner)?;
        }
        map.end()
    }
}

/// A user's profile joined with the works they own
///
/// Serializes as `{ ..user, "works": [ { ..work }, .. ] }`.
#[derive(Debug, Clone, PartialEq)]
pub struct DevDetails {
    /// User document fields
    pub user: Fields,
    /// Fields of every work the user owns
    pub works: Vec<Fields>,
}

impl Serialize for DevDetails {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.user.iter().filter(|(k, _)| *k != WORKS_KEY) {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(WORKS_KEY, &self.works)?;
        map.end()
    }
}

/// Read-only joins over the privileged store handle
#[derive(Clone)]
pub struct ServerDb {
    store: Arc<dyn DocumentStore>,
}

impl ServerDb {
    /// Join over `store`
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Join over an admin app's store
    #[must_use]
    pub fn from_app(app: &AdminApp) -> Self {
        Self::new(app.store())
    }

    /// Work document plus its owner's profile
    ///
    /// # Errors
    /// - `AccessError::NotFound` if the work does not exist
    /// - `AccessError::MissingField` if the work names no owner
    /// - `AccessError::Store` for store failures
    pub async fn get_work_details(&self, work_id: &WorkId) -> Result<WorkDetails, AccessError> {
        let work = self.require(&layout::work(work_id)?).await?;
        let owner = work
            .get_str(OWNER_FIELD)
            .map(UserId::new)
            .ok_or_else(|| AccessError::MissingField {
                path: work.path.to_string(),
                field: OWNER_FIELD,
            })?;

        let owner_data = self.store.get(&layout::user(&owner)?).await?;
        if owner_data.is_none() {
            tracing::debug!(%work_id, %owner, "work owner has no profile");
        }

        Ok(WorkDetails {
            work: work.into_fields(),
            owner_data: owner_data.map(Document::into_fields),
        })
    }

    /// User profile plus every work it owns
    ///
    /// # Errors
    /// - `AccessError::NotFound` if the user does not exist
    /// - `AccessError::Store` for store failures
    pub async fn get_dev_details(&self, dev_id: &UserId) -> Result<DevDetails, AccessError> {
        let user = self.require(&layout::user(dev_id)?).await?;
        let owned = Query::new(layout::works()?).where_eq(OWNER_FIELD, dev_id.as_str());
        let works = self.store.query(&owned).await?;
        tracing::debug!(%dev_id, works = works.len(), "dev details joined");

        Ok(DevDetails {
            user: user.into_fields(),
            works: works.into_iter().map(Document::into_fields).collect(),
        })
    }

    async fn require(&self, path: &DocPath) -> Result<Document, AccessError> {
        self.store
            .get(path)
            .await?
            .ok_or_else(|| AccessError::NotFound {
                path: path.to_string(),
            })
    }
}

impl std::fmt::Debug for ServerDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDb").finish_non_exhaustive()
    }
}
