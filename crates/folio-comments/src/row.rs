//! Comment row controller
//!
//! One [`CommentRow`] owns the edit/delete lifecycle of a single rendered
//! comment.
//!
//! # State machine
//!
//! ```text
//!            begin_edit                submit (non-empty)
//! Viewing ─────────────▶ Editing ─────────────────────────▶ Viewing + Updating
//!    │                      │                                   │
//!    │ delete               │ submit (blank)                    │ store error
//!    ▼                      ▼                                   ▼
//! Deleting ◀────────────────┘                          Editing (input restored)
//! ```
//!
//! At most one store mutation is in flight per row. Actions arriving while one
//! is pending are ignored. Failures are logged and rolled back locally; they
//! never leave this module.

use crate::date;
use crate::db::CommentsDb;
use crate::model::{Comment, CommentId, UserProfile};
use parking_lot::Mutex;
use std::sync::Arc;

/// Store mutation a row is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingOp {
    /// Delete in flight
    Deleting,
    /// Text update in flight
    Updating,
}

/// Coarse lifecycle phase of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowPhase {
    /// Showing the comment text
    Viewing,
    /// Editor open, nothing in flight
    Editing,
    /// A store mutation is in flight
    Submitting(PendingOp),
}

/// Result of a user action on a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Action not applicable in the current state; no store call was made
    Ignored,
    /// Text update committed
    Updated,
    /// Delete committed
    Deleted,
    /// Store call failed and the row was rolled back
    Failed,
}

/// Key press delivered to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    /// Key pressed
    pub key: Key,
    /// Whether Shift was held
    pub shift: bool,
}

/// Keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Return / Enter
    Enter,
    /// Any other key
    Other,
}

impl KeyInput {
    /// Plain Enter
    #[must_use]
    pub fn enter() -> Self {
        Self {
            key: Key::Enter,
            shift: false,
        }
    }

    /// Shift+Enter
    #[must_use]
    pub fn shift_enter() -> Self {
        Self {
            key: Key::Enter,
            shift: true,
        }
    }
}

/// What a key press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Submitted the editor
    Submitted(RowOutcome),
    /// Inserted a newline into the input
    Newline,
    /// Left for the input's default handling
    Passthrough,
}

/// Headless render model of a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    /// Comment id
    pub id: CommentId,
    /// Author name, once the profile has loaded
    pub author_name: Option<String>,
    /// Author avatar, once the profile has loaded
    pub author_photo: Option<String>,
    /// Comment text as last received from the store
    pub text: String,
    /// Editor contents while editing
    pub editor: Option<String>,
    /// Delete in flight
    pub deleting: bool,
    /// Update in flight
    pub updating: bool,
    /// Formatted creation time
    pub timestamp: Option<String>,
}

#[derive(Debug)]
struct RowState {
    comment: Comment,
    author: Option<UserProfile>,
    edit_mode: bool,
    pending: Option<PendingOp>,
    input: String,
}

/// Controller for one comment row
///
/// Shared as `Arc<CommentRow>`; every method takes `&self` so a second action
/// can arrive while the first is awaiting the store.
#[derive(Debug)]
pub struct CommentRow {
    db: Arc<CommentsDb>,
    state: Mutex<RowState>,
}

impl CommentRow {
    /// Create a row in `Viewing`
    #[must_use]
    pub fn new(db: Arc<CommentsDb>, comment: Comment) -> Self {
        Self {
            db,
            state: Mutex::new(RowState {
                comment,
                author: None,
                edit_mode: false,
                pending: None,
                input: String::new(),
            }),
        }
    }

    /// Comment id
    #[must_use]
    pub fn id(&self) -> CommentId {
        self.state.lock().comment.id.clone()
    }

    /// Latest comment data
    #[must_use]
    pub fn comment(&self) -> Comment {
        self.state.lock().comment.clone()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> RowPhase {
        let state = self.state.lock();
        match (state.pending, state.edit_mode) {
            (Some(op), _) => RowPhase::Submitting(op),
            (None, true) => RowPhase::Editing,
            (None, false) => RowPhase::Viewing,
        }
    }

    /// Whether the editor is open
    ///
    /// An optimistic update closes the editor before the store answers, so
    /// this is `false` while `Updating` is pending.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.state.lock().edit_mode
    }

    /// Mutation in flight, if any
    #[must_use]
    pub fn pending(&self) -> Option<PendingOp> {
        self.state.lock().pending
    }

    /// Editor contents
    #[must_use]
    pub fn input(&self) -> String {
        self.state.lock().input.clone()
    }

    /// Replace editor contents
    pub fn set_input(&self, text: impl Into<String>) {
        self.state.lock().input = text.into();
    }

    /// Loaded author profile
    #[must_use]
    pub fn author(&self) -> Option<UserProfile> {
        self.state.lock().author.clone()
    }

    /// Apply a fresh emission of this comment
    ///
    /// The editor input is left alone so an in-progress edit survives.
    pub fn refresh(&self, comment: Comment) {
        let mut state = self.state.lock();
        if state.comment.owner != comment.owner {
            state.author = None;
        }
        state.comment = comment;
    }

    /// Open the editor, seeded with the current text
    ///
    /// Refused (returns `false`) while a delete is pending.
    pub fn begin_edit(&self) -> bool {
        let mut state = self.state.lock();
        if state.pending == Some(PendingOp::Deleting) {
            tracing::debug!(comment = %state.comment.id, "edit refused while deleting");
            return false;
        }
        if !state.edit_mode {
            state.edit_mode = true;
            state.input = state.comment.text.clone();
        }
        true
    }

    /// Delete the comment
    ///
    /// Ignored while any mutation is pending. On failure the row simply stays.
    pub async fn delete(&self) -> RowOutcome {
        let (work_id, comment_id) = {
            let mut state = self.state.lock();
            if state.pending.is_some() {
                return RowOutcome::Ignored;
            }
            state.pending = Some(PendingOp::Deleting);
            (state.comment.work_id.clone(), state.comment.id.clone())
        };

        let result = self.db.delete_comment(&work_id, &comment_id).await;
        self.state.lock().pending = None;

        match result {
            Ok(()) => {
                tracing::info!(%work_id, comment = %comment_id, "comment deleted");
                RowOutcome::Deleted
            }
            Err(e) => {
                tracing::warn!(%work_id, comment = %comment_id, error = %e, "delete failed");
                RowOutcome::Failed
            }
        }
    }

    /// Submit the editor
    ///
    /// Blank input (after trimming) closes the editor and deletes the comment,
    /// exactly like [`delete`](Self::delete). Otherwise the editor
    /// closes immediately and the trimmed text is written; if the write fails
    /// the editor reopens holding exactly what was submitted.
    pub async fn submit(&self) -> RowOutcome {
        let prepared = {
            let mut state = self.state.lock();
            if !state.edit_mode || state.pending.is_some() {
                return RowOutcome::Ignored;
            }
            let text = state.input.trim().to_string();
            if text.is_empty() {
                state.edit_mode = false;
                state.input.clear();
                None
            } else {
                state.pending = Some(PendingOp::Updating);
                state.edit_mode = false;
                let submitted = std::mem::take(&mut state.input);
                Some((
                    state.comment.work_id.clone(),
                    state.comment.id.clone(),
                    submitted,
                    text,
                ))
            }
        };
        let Some((work_id, comment_id, submitted, text)) = prepared else {
            return self.delete().await;
        };

        let result = self
            .db
            .update_comment_text(&work_id, &comment_id, &text)
            .await;

        let mut state = self.state.lock();
        state.pending = None;
        match result {
            Ok(()) => {
                tracing::info!(%work_id, comment = %comment_id, "comment updated");
                RowOutcome::Updated
            }
            Err(e) => {
                tracing::warn!(%work_id, comment = %comment_id, error = %e, "update failed, reopening editor");
                state.edit_mode = true;
                state.input = submitted;
                RowOutcome::Failed
            }
        }
    }

    /// Route a key press from the editor
    ///
    /// Enter submits; Shift+Enter adds a newline.
    pub async fn handle_key(&self, input: KeyInput) -> KeyOutcome {
        if input.key != Key::Enter || !self.is_editing() {
            return KeyOutcome::Passthrough;
        }
        if input.shift {
            self.state.lock().input.push('\n');
            return KeyOutcome::Newline;
        }
        KeyOutcome::Submitted(self.submit().await)
    }

    /// Load the author's profile for display
    ///
    /// A missing profile or a failed read leaves the row without an author.
    pub async fn load_author(&self) -> Option<UserProfile> {
        let owner = self.state.lock().comment.owner.clone();
        match self.db.fetch_user(&owner).await {
            Ok(profile) => {
                let mut state = self.state.lock();
                if state.comment.owner == owner {
                    state.author.clone_from(&profile);
                }
                profile
            }
            Err(e) => {
                tracing::warn!(user = %owner, error = %e, "author lookup failed");
                None
            }
        }
    }

    /// Snapshot for rendering
    #[must_use]
    pub fn view(&self) -> RowView {
        let state = self.state.lock();
        RowView {
            id: state.comment.id.clone(),
            author_name: state.author.as_ref().map(|a| a.display_name.clone()),
            author_photo: state.author.as_ref().and_then(|a| a.photo_url.clone()),
            text: state.comment.text.clone(),
            editor: state.edit_mode.then(|| state.input.clone()),
            deleting: state.pending == Some(PendingOp::Deleting),
            updating: state.pending == Some(PendingOp::Updating),
            timestamp: state.comment.created_millis().and_then(date::format_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{UserId, WorkId};
    use folio_store::{AccessRule, DocumentStore, MemoryStore, WriteKind, WriteRequest};
    use folio_test_utils::{seed_comment, seed_user, RecordingStore, StoreCall};
    use pretty_assertions::assert_eq;

    fn comment(id: &str, text: &str) -> Comment {
        Comment {
            id: CommentId::new(id),
            work_id: WorkId::new("w1"),
            owner: UserId::new("u1"),
            text: text.to_string(),
            created: Some(folio_store::Timestamp::from_seconds(1_600_000_000)),
        }
    }

    fn row_over(store: Arc<dyn DocumentStore>, text: &str) -> CommentRow {
        CommentRow::new(Arc::new(CommentsDb::new(store)), comment("c1", text))
    }

    async fn seeded(text: &str) -> (MemoryStore, CommentRow) {
        let store = MemoryStore::new();
        seed_comment(&store, "w1", "c1", "u1", text, 1_600_000_000).await;
        let row = row_over(Arc::new(store.clone()), text);
        (store, row)
    }

    fn reject(kind: WriteKind) -> AccessRule {
        Arc::new(move |req: &WriteRequest<'_>| {
            if req.kind == kind {
                Err("denied".to_string())
            } else {
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn starts_viewing() {
        let (_, row) = seeded("hello").await;
        assert_eq!(row.phase(), RowPhase::Viewing);
        assert!(row.view().editor.is_none());
    }

    #[tokio::test]
    async fn begin_edit_seeds_input() {
        let (_, row) = seeded("hello").await;
        assert!(row.begin_edit());
        assert_eq!(row.phase(), RowPhase::Editing);
        assert_eq!(row.input(), "hello");

        row.set_input("draft");
        assert!(row.begin_edit());
        assert_eq!(row.input(), "draft");
    }

    #[tokio::test]
    async fn submit_updates_trimmed_text() {
        let (store, row) = seeded("hello").await;
        row.begin_edit();
        row.set_input("  edited  ");

        assert_eq!(row.submit().await, RowOutcome::Updated);
        assert_eq!(row.phase(), RowPhase::Viewing);
        assert_eq!(row.input(), "");

        let doc = store
            .get(&"works/w1/comments/c1".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.get_str("text"), Some("edited"));
    }

    #[tokio::test]
    async fn blank_submit_deletes() {
        let (store, row) = seeded("hello").await;
        row.begin_edit();
        row.set_input(" \n\t ");

        assert_eq!(row.submit().await, RowOutcome::Deleted);
        assert!(store.is_empty());
        assert_eq!(row.phase(), RowPhase::Viewing);
    }

    #[tokio::test]
    async fn failed_blank_submit_returns_to_viewing() {
        let (store, row) = seeded("hello").await;
        store.set_rules(Some(reject(WriteKind::Delete)));
        row.begin_edit();
        row.set_input("   ");

        assert_eq!(row.submit().await, RowOutcome::Failed);
        assert_eq!(row.phase(), RowPhase::Viewing);
        assert!(row.view().editor.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn view_survives_out_of_range_timestamp() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mut far = comment("c1", "far future");
        far.created = Some(folio_store::Timestamp::from_seconds(i64::MAX / 100));
        let row = CommentRow::new(Arc::new(CommentsDb::new(store)), far);

        let view = row.view();
        assert_eq!(view.timestamp, None);
        assert_eq!(view.text, "far future");
    }

    #[tokio::test]
    async fn submit_outside_editing_is_ignored() {
        let (_, row) = seeded("hello").await;
        assert_eq!(row.submit().await, RowOutcome::Ignored);
    }

    #[tokio::test]
    async fn failed_update_restores_submitted_input() {
        let (store, row) = seeded("hello").await;
        store.set_rules(Some(reject(WriteKind::Update)));
        row.begin_edit();
        row.set_input(" retry me ");

        assert_eq!(row.submit().await, RowOutcome::Failed);
        assert_eq!(row.phase(), RowPhase::Editing);
        assert_eq!(row.input(), " retry me ");
    }

    #[tokio::test]
    async fn update_of_vanished_comment_reopens_editor() {
        let (store, row) = seeded("hello").await;
        store
            .delete(&"works/w1/comments/c1".parse().unwrap())
            .await
            .unwrap();
        row.begin_edit();
        row.set_input("too late");

        assert_eq!(row.submit().await, RowOutcome::Failed);
        assert!(row.is_editing());
        assert_eq!(row.input(), "too late");
    }

    #[tokio::test]
    async fn failed_delete_leaves_row_viewing() {
        let (store, row) = seeded("hello").await;
        store.set_rules(Some(reject(WriteKind::Delete)));

        assert_eq!(row.delete().await, RowOutcome::Failed);
        assert_eq!(row.phase(), RowPhase::Viewing);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_of_missing_comment_succeeds() {
        let row = row_over(Arc::new(MemoryStore::new()), "ghost");
        assert_eq!(row.delete().await, RowOutcome::Deleted);
    }

    #[tokio::test]
    async fn enter_submits_shift_enter_inserts_newline() {
        let (store, row) = seeded("hello").await;
        assert_eq!(row.handle_key(KeyInput::enter()).await, KeyOutcome::Passthrough);

        row.begin_edit();
        row.set_input("line one");
        assert_eq!(
            row.handle_key(KeyInput::shift_enter()).await,
            KeyOutcome::Newline
        );
        assert_eq!(row.input(), "line one\n");
        assert!(row.is_editing());

        row.set_input("line one\nline two");
        assert_eq!(
            row.handle_key(KeyInput {
                key: Key::Other,
                shift: false
            })
            .await,
            KeyOutcome::Passthrough
        );
        assert_eq!(
            row.handle_key(KeyInput::enter()).await,
            KeyOutcome::Submitted(RowOutcome::Updated)
        );
        let doc = store
            .get(&"works/w1/comments/c1".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.get_str("text"), Some("line one\nline two"));
    }

    #[tokio::test]
    async fn update_closes_editor_before_store_answers() {
        let store = MemoryStore::new();
        seed_comment(&store, "w1", "c1", "u1", "hello", 1).await;
        let recording = Arc::new(RecordingStore::gated(store));
        let row = Arc::new(row_over(recording.clone(), "hello"));

        row.begin_edit();
        row.set_input("optimistic");
        let task = tokio::spawn({
            let row = Arc::clone(&row);
            async move { row.submit().await }
        });

        recording.mutation_started().await;
        assert!(!row.is_editing());
        assert_eq!(row.phase(), RowPhase::Submitting(PendingOp::Updating));
        assert!(row.view().updating);

        // Second actions while in flight make no store calls.
        assert_eq!(row.delete().await, RowOutcome::Ignored);
        assert!(row.begin_edit());
        row.set_input("again");
        assert_eq!(row.submit().await, RowOutcome::Ignored);
        assert_eq!(recording.writes().len(), 1);

        recording.release(1);
        assert_eq!(task.await.unwrap(), RowOutcome::Updated);
        assert_eq!(row.pending(), None);
        assert_eq!(
            recording.writes(),
            vec![StoreCall::Update {
                path: "works/w1/comments/c1".to_string(),
                fields: folio_test_utils::object(serde_json::json!({ "text": "optimistic" })),
            }]
        );
    }

    #[tokio::test]
    async fn edit_refused_while_deleting() {
        let store = MemoryStore::new();
        seed_comment(&store, "w1", "c1", "u1", "hello", 1).await;
        let recording = Arc::new(RecordingStore::gated(store));
        let row = Arc::new(row_over(recording.clone(), "hello"));

        let task = tokio::spawn({
            let row = Arc::clone(&row);
            async move { row.delete().await }
        });
        recording.mutation_started().await;

        assert_eq!(row.phase(), RowPhase::Submitting(PendingOp::Deleting));
        assert!(!row.begin_edit());
        assert!(!row.is_editing());
        assert_eq!(row.delete().await, RowOutcome::Ignored);
        assert!(row.view().deleting);

        recording.release(1);
        assert_eq!(task.await.unwrap(), RowOutcome::Deleted);
        assert_eq!(recording.writes().len(), 1);
    }

    #[tokio::test]
    async fn view_includes_author_and_timestamp() {
        let (store, row) = seeded("hello").await;
        seed_user(&store, "u1", "Al").await;

        assert!(row.view().author_name.is_none());
        let author = row.load_author().await.unwrap();
        assert_eq!(author.display_name, "Al");

        let view = row.view();
        assert_eq!(view.author_name.as_deref(), Some("Al"));
        assert_eq!(
            view.author_photo.as_deref(),
            Some("https://img.example/u1.png")
        );
        assert_eq!(view.timestamp.as_deref(), Some("Sep 13, 2020"));
        assert_eq!(view.text, "hello");
    }

    #[tokio::test]
    async fn missing_author_leaves_view_blank() {
        let (_, row) = seeded("hello").await;
        assert!(row.load_author().await.is_none());
        assert!(row.view().author_name.is_none());
    }

    #[tokio::test]
    async fn refresh_keeps_editor_input() {
        let (_, row) = seeded("hello").await;
        row.begin_edit();
        row.set_input("draft");

        row.refresh(comment("c1", "changed elsewhere"));
        assert_eq!(row.comment().text, "changed elsewhere");
        assert_eq!(row.input(), "draft");
        assert!(row.is_editing());
    }
}
