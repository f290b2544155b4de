//! Folio Comments - live comment threads on works
//!
//! - [`CommentsDb`] wraps the document store for comment and profile access
//! - [`CommentRow`] drives one comment's view / edit / submit lifecycle with
//!   optimistic updates and rollback
//! - [`CommentSection`] keeps a list of rows in step with a live subscription
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_comments::prelude::*;
//! use folio_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), folio_store::StoreError> {
//! let db = Arc::new(CommentsDb::new(Arc::new(MemoryStore::new())));
//! let mut section = CommentSection::new(db);
//! section.mount(WorkId::new("w1"))?;
//!
//! while let Some(update) = section.next_update().await {
//!     println!("{} comments", update?);
//!     section.load_authors().await;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod config;
pub mod date;
pub mod db;
pub mod error;
pub mod layout;
pub mod model;
pub mod row;
pub mod section;

pub use config::CommentsConfig;
pub use date::format_millis;
pub use db::{CommentFeed, CommentsDb};
pub use error::CommentError;
pub use model::{Comment, CommentId, UserId, UserProfile, WorkId};
pub use row::{CommentRow, Key, KeyInput, KeyOutcome, PendingOp, RowOutcome, RowPhase, RowView};
pub use section::CommentSection;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with comment threads
    pub use crate::{
        Comment, CommentId, CommentRow, CommentSection, CommentsConfig, CommentsDb, KeyInput,
        RowOutcome, RowPhase, UserId, WorkId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
