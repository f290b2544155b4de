//! Privileged store handles
//!
//! An [`AdminApp`] is the server-held, credentialed connection to the store.
//! Apps live in an [`AdminRegistry`] keyed by name; initializing the same name
//! twice is reported as [`InitError::DuplicateApp`], which callers re-entering
//! startup (hot reload) treat as benign through
//! [`AdminRegistry::initialize_or_reuse`].

use crate::config::{ServerConfig, ServerCredential};
use crate::error::InitError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use folio_store::{DocumentStore, MemoryStore};
use std::fmt;
use std::sync::Arc;

/// Opens a store connection for a credential
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connect using `config`
    async fn connect(&self, config: &ServerConfig) -> Result<Arc<dyn DocumentStore>, InitError>;
}

/// Connector handing out one shared in-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
}

impl MemoryConnector {
    /// Hand out `store` on every connect
    #[must_use]
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self, config: &ServerConfig) -> Result<Arc<dyn DocumentStore>, InitError> {
        tracing::debug!(
            project_id = %config.credential.project_id,
            "connecting in-process store"
        );
        Ok(Arc::new(self.store.clone()))
    }
}

/// Credentialed store handle
pub struct AdminApp {
    name: String,
    credential: ServerCredential,
    database_url: Option<String>,
    store: Arc<dyn DocumentStore>,
}

impl AdminApp {
    /// Registry name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Credential project id
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.credential.project_id
    }

    /// Credential client email
    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.credential.client_email
    }

    /// Configured database URL
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// Privileged store handle
    #[must_use]
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }
}

impl fmt::Debug for AdminApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminApp")
            .field("name", &self.name)
            .field("credential", &self.credential)
            .field("database_url", &self.database_url)
            .finish_non_exhaustive()
    }
}

/// Named admin apps for this process
#[derive(Debug, Default)]
pub struct AdminRegistry {
    apps: DashMap<String, Arc<AdminApp>>,
}

impl AdminRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the app named by `config.app_name`
    ///
    /// # Errors
    /// `InitError::DuplicateApp` if the name is taken, or whatever the
    /// connector reports
    pub async fn initialize(
        &self,
        config: &ServerConfig,
        connector: &dyn StoreConnector,
    ) -> Result<Arc<AdminApp>, InitError> {
        let name = config.app_name.clone();
        if self.apps.contains_key(&name) {
            return Err(InitError::DuplicateApp { name });
        }

        let store = connector.connect(config).await?;
        match self.apps.entry(name) {
            Entry::Occupied(entry) => Err(InitError::DuplicateApp {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                let app = Arc::new(AdminApp {
                    name: entry.key().clone(),
                    credential: config.credential.clone(),
                    database_url: config.database_url.clone(),
                    store,
                });
                entry.insert(Arc::clone(&app));
                tracing::info!(
                    app = %app.name,
                    project_id = %app.credential.project_id,
                    "admin app initialized"
                );
                Ok(app)
            }
        }
    }

    /// Like [`initialize`](Self::initialize), but an existing app of the same
    /// name is returned instead of an error
    ///
    /// # Errors
    /// Every initialization error except `DuplicateApp`
    pub async fn initialize_or_reuse(
        &self,
        config: &ServerConfig,
        connector: &dyn StoreConnector,
    ) -> Result<Arc<AdminApp>, InitError> {
        match self.initialize(config, connector).await {
            Ok(app) => Ok(app),
            Err(InitError::DuplicateApp { name }) => {
                tracing::debug!(app = %name, "admin app already initialized, reusing");
                self.get(&name).ok_or(InitError::DuplicateApp { name })
            }
            Err(e) => {
                tracing::error!(error = %e, "admin app initialization failed");
                Err(e)
            }
        }
    }

    /// App registered under `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<AdminApp>> {
        self.apps.get(name).map(|app| Arc::clone(app.value()))
    }

    /// Number of registered apps
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether no app is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
