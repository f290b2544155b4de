//! Collection layout
//!
//! ```text
//! works/{workId}                      work document
//! works/{workId}/comments/{commentId} comment: owner, text, created
//! users/{userId}                      profile: displayName, photoURL
//! ```

use crate::model::{CommentId, UserId, WorkId};
use folio_store::{CollectionPath, DocPath, PathError};

/// Top-level works collection
pub const WORKS: &str = "works";
/// Comment subcollection under each work
pub const COMMENTS: &str = "comments";
/// Top-level users collection
pub const USERS: &str = "users";

/// Field holding a work's or comment's owning user id
pub const OWNER_FIELD: &str = "owner";
/// Field holding comment text
pub const TEXT_FIELD: &str = "text";
/// Field holding the server-assigned creation time
pub const CREATED_FIELD: &str = "created";

/// `works`
///
/// # Errors
/// Never for the fixed name
pub fn works() -> Result<CollectionPath, PathError> {
    CollectionPath::root(WORKS)
}

/// `works/{work_id}`
///
/// # Errors
/// Returns error if the id is not a valid path segment
pub fn work(work_id: &WorkId) -> Result<DocPath, PathError> {
    works()?.doc(work_id.as_str())
}

/// `works/{work_id}/comments`
///
/// # Errors
/// Returns error if the id is not a valid path segment
pub fn comments(work_id: &WorkId) -> Result<CollectionPath, PathError> {
    work(work_id)?.collection(COMMENTS)
}

/// `works/{work_id}/comments/{comment_id}`
///
/// # Errors
/// Returns error if either id is not a valid path segment
pub fn comment(work_id: &WorkId, comment_id: &CommentId) -> Result<DocPath, PathError> {
    comments(work_id)?.doc(comment_id.as_str())
}

/// `users`
///
/// # Errors
/// Never for the fixed name
pub fn users() -> Result<CollectionPath, PathError> {
    CollectionPath::root(USERS)
}

/// `users/{user_id}`
///
/// # Errors
/// Returns error if the id is not a valid path segment
pub fn user(user_id: &UserId) -> Result<DocPath, PathError> {
    users()?.doc(user_id.as_str())
}
