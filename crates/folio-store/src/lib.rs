//! Folio Store - document database seam
//!
//! The hosted document database is an external collaborator. This crate gives
//! it a typed surface:
//! - [`DocPath`] / [`CollectionPath`] for addressing
//! - [`Document`] and [`Timestamp`] for bodies and server timestamps
//! - [`DocumentStore`] for CRUD, queries and live listeners
//! - [`MemoryStore`], an in-process implementation with access rules
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_store::{CollectionPath, DocumentStore, MemoryStore};
//!
//! # async fn example() -> Result<(), folio_store::StoreError> {
//! let store = MemoryStore::new();
//! let comments: CollectionPath = "works/w1/comments".parse()?;
//!
//! let mut live = store.listen(&comments);
//! while let Some(snapshot) = live.next_snapshot().await {
//!     println!("{} comments", snapshot?.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod memory;
pub mod path;
pub mod store;
pub mod subscription;

pub use document::{Document, Fields, Filter, NewDocument, Query, Timestamp};
pub use error::StoreError;
pub use memory::{AccessRule, MemoryStore, WriteKind, WriteRequest};
pub use path::{CollectionPath, DocPath, PathError};
pub use store::DocumentStore;
pub use subscription::{SnapshotResult, SnapshotSender, Subscription};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
