//! Folio Server - privileged joins over works and owners
//!
//! - [`ServerConfig`]: the server-held credential, read once at startup
//! - [`AdminRegistry`] / [`AdminApp`]: the initialized, credentialed store handle
//! - [`ServerDb`]: `get_work_details` and `get_dev_details`
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_server::{AdminRegistry, MemoryConnector, ServerConfig, ServerDb};
//! use folio_comments::WorkId;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::from_env()?;
//! let registry = AdminRegistry::new();
//! let app = registry
//!     .initialize_or_reuse(&config, &MemoryConnector::default())
//!     .await?;
//!
//! let details = ServerDb::from_app(&app)
//!     .get_work_details(&WorkId::new("w1"))
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&details)?);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod accessor;
pub mod admin;
pub mod config;
pub mod error;
pub mod seed;

pub use accessor::{DevDetails, ServerDb, WorkDetails};
pub use admin::{AdminApp, AdminRegistry, MemoryConnector, StoreConnector};
pub use config::{ServerConfig, ServerCredential};
pub use error::{AccessError, ConfigError, InitError, SeedError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
