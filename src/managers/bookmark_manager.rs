//! Bookmark Manager for Smartmark.
//!
//! Owns the in-memory bookmark collection and keeps it consistent with the
//! remote store: every mutation is applied optimistically, then committed or
//! rolled back once the remote result is known. Derived views and the tag
//! inventory are computed from the collection on demand; failures surface as
//! transient notices on a channel the presentation layer drains.

use std::future::Future;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::managers::click_timers::ClickTimers;
use crate::services::filter_engine;
use crate::services::remote_store::RemoteStore;
use crate::types::bookmark::{
    normalize_url, Bookmark, BookmarkPatch, NewBookmark, ViewFilter, GENERAL_TAG,
};
use crate::types::errors::{MutationError, StoreError};
use crate::types::notice::Notice;

/// Debounce window for the favorite tap-vs-double-tap gesture.
pub const FAVORITE_DEBOUNCE: Duration = Duration::from_millis(230);

/// What a remote mutation call produced.
enum RemoteOutcome {
    /// Affected rows from a row-returning call; empty means the backend's
    /// authorization policy blocked the write.
    Rows(Vec<Bookmark>),
    /// A call with no row semantics (delete) completed.
    Done,
}

struct ModelState {
    owner: Option<String>,
    bookmarks: Vec<Bookmark>,
    /// Single-flight guard for create.
    saving: bool,
    /// Next temporary key for a not-yet-confirmed record; always negative.
    next_temp_id: i64,
    selected_tag: String,
    view_filter: ViewFilter,
    search: String,
}

impl ModelState {
    fn new() -> Self {
        Self {
            owner: None,
            bookmarks: Vec::new(),
            saving: false,
            next_temp_id: -1,
            selected_tag: crate::types::bookmark::ALL_TAG.to_string(),
            view_filter: ViewFilter::All,
            search: String::new(),
        }
    }
}

/// Reconciling view model over the remote bookmark table.
pub struct BookmarkManager {
    store: Arc<dyn RemoteStore>,
    state: Mutex<ModelState>,
    timers: ClickTimers,
    notices: UnboundedSender<Notice>,
    debounce_window: Duration,
    /// Self-handle for the deferred gesture tasks.
    weak: Weak<BookmarkManager>,
}

impl BookmarkManager {
    /// Creates a manager over the given store. The returned receiver carries
    /// the transient notices mutations emit.
    pub fn new(store: Arc<dyn RemoteStore>) -> (Arc<Self>, UnboundedReceiver<Notice>) {
        Self::with_debounce_window(store, FAVORITE_DEBOUNCE)
    }

    /// Like [`BookmarkManager::new`] with an explicit gesture debounce
    /// window (tests shorten it).
    pub fn with_debounce_window(
        store: Arc<dyn RemoteStore>,
        debounce_window: Duration,
    ) -> (Arc<Self>, UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = Arc::new_cyclic(|weak| Self {
            store,
            state: Mutex::new(ModelState::new()),
            timers: ClickTimers::new(),
            notices: tx,
            debounce_window,
            weak: weak.clone(),
        });
        (manager, rx)
    }

    fn notify(&self, notice: Notice) {
        // The receiver may be gone; an undeliverable notice is dropped.
        let _ = self.notices.send(notice);
    }

    // === Session ===

    /// Asks the store who is signed in and adopts that identity. Switching
    /// users (or losing the session) clears the collection and cancels any
    /// pending gesture timers.
    pub async fn resolve_user(&self) -> Result<Option<String>, StoreError> {
        let user = self.store.current_user().await?;
        let changed;
        {
            let mut state = self.state.lock().unwrap();
            let incoming = user.as_ref().map(|u| u.id.clone());
            changed = state.owner != incoming;
            if changed {
                state.bookmarks.clear();
                state.saving = false;
            }
            state.owner = incoming;
        }
        if changed {
            self.timers.cancel_all();
        }
        Ok(user.map(|u| u.id))
    }

    /// Replaces the collection with the owner's rows from the store,
    /// newest first.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let owner = self.owner().ok_or(StoreError::NotAuthenticated)?;
        let rows = self.store.list_bookmarks(&owner).await?;
        let mut state = self.state.lock().unwrap();
        // The session may have changed while the fetch was in flight.
        if state.owner.as_deref() == Some(owner.as_str()) {
            state.bookmarks = rows;
        }
        Ok(())
    }

    /// Ends the session and drops all local state.
    pub async fn sign_out(&self) -> Result<(), StoreError> {
        self.store.sign_out().await?;
        self.timers.cancel_all();
        let mut state = self.state.lock().unwrap();
        state.owner = None;
        state.bookmarks.clear();
        state.saving = false;
        Ok(())
    }

    // === Mutations ===

    /// Creates a bookmark: optimistic provisional record first, then the
    /// remote insert, then in-place confirmation or removal.
    ///
    /// Rejected without a remote call when title or url is blank, no user is
    /// signed in, or another create is still in flight.
    pub async fn create(
        &self,
        title: &str,
        url: &str,
        tag: &str,
    ) -> Result<Bookmark, MutationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(MutationError::ValidationRejected(
                "title is required".to_string(),
            ));
        }
        let url = normalize_url(url);
        if url.is_empty() {
            return Err(MutationError::ValidationRejected(
                "url is required".to_string(),
            ));
        }
        let tag = match tag.trim() {
            "" => GENERAL_TAG,
            t => t,
        };

        let (owner, temp_id) = {
            let mut state = self.state.lock().unwrap();
            let owner = state.owner.clone().ok_or_else(|| {
                MutationError::ValidationRejected("no user signed in".to_string())
            })?;
            if state.saving {
                return Err(MutationError::ValidationRejected(
                    "a save is already in flight".to_string(),
                ));
            }
            state.saving = true;
            let temp_id = state.next_temp_id;
            state.next_temp_id -= 1;

            let provisional = Bookmark {
                id: temp_id,
                title: title.to_string(),
                url: url.clone(),
                tag: Some(tag.to_string()),
                user_id: owner.clone(),
                created_at: Utc::now(),
                favorite: false,
                pinned: false,
                is_read: true,
                archived: false,
            };
            state.bookmarks.insert(0, provisional);
            (owner, temp_id)
        };

        let payload = NewBookmark::new(title, &url, Some(tag), &owner);
        let result = self.store.insert_bookmark(&payload).await;

        let mut state = self.state.lock().unwrap();
        state.saving = false;
        match result {
            Ok(confirmed) => {
                debug!(id = confirmed.id, "create confirmed");
                // Replace the provisional record in place; its position is
                // kept rather than re-sorting on the server timestamp.
                if let Some(slot) = state.bookmarks.iter_mut().find(|b| b.id == temp_id) {
                    *slot = confirmed.clone();
                }
                state.view_filter = ViewFilter::Recent;
                drop(state);
                self.notify(Notice::info("Bookmark added"));
                Ok(confirmed)
            }
            Err(e) => {
                warn!("create rolled back: {}", e);
                state.bookmarks.retain(|b| b.id != temp_id);
                drop(state);
                self.notify(Notice::error("Save failed"));
                Err(e.into())
            }
        }
    }

    /// Applies a patch to an existing bookmark with full-collection snapshot
    /// rollback. Zero affected rows surfaces as [`MutationError::PolicyBlocked`].
    pub async fn update(&self, id: i64, patch: BookmarkPatch) -> Result<Bookmark, MutationError> {
        let owner = self.owner().ok_or_else(|| {
            MutationError::ValidationRejected("no user signed in".to_string())
        })?;
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            if !state.bookmarks.iter().any(|b| b.id == id) {
                return Err(MutationError::ValidationRejected(format!(
                    "unknown bookmark id {}",
                    id
                )));
            }
            let snapshot = state.bookmarks.clone();
            if let Some(record) = state.bookmarks.iter_mut().find(|b| b.id == id) {
                patch.apply_to(record);
            }
            snapshot
        };

        let remote = self.store.update_bookmark(id, &owner, &patch);
        let confirmed = self
            .reconcile(
                async move { remote.await.map(RemoteOutcome::Rows) },
                "Update failed",
                move |state, row| {
                    if let Some(slot) = state.bookmarks.iter_mut().find(|b| b.id == id) {
                        *slot = row.clone();
                    }
                },
                move |state| state.bookmarks = snapshot,
            )
            .await?;
        confirmed.ok_or(MutationError::PolicyBlocked)
    }

    /// Removes a bookmark optimistically; the snapshot is restored when the
    /// remote delete fails.
    pub async fn delete(&self, id: i64) -> Result<(), MutationError> {
        let owner = self.owner().ok_or_else(|| {
            MutationError::ValidationRejected("no user signed in".to_string())
        })?;
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            let snapshot = state.bookmarks.clone();
            state.bookmarks.retain(|b| b.id != id);
            snapshot
        };

        let remote = self.store.delete_bookmark(id, &owner);
        self.reconcile(
            async move { remote.await.map(|_| RemoteOutcome::Done) },
            "Delete failed",
            |_, _| {},
            move |state| state.bookmarks = snapshot,
        )
        .await?;
        self.notify(Notice::info("Deleted"));
        Ok(())
    }

    /// Sets the favorite flag optimistically. Rollback touches only this
    /// record, so concurrent mutations of other records are never clobbered;
    /// on success the server-returned flag is adopted.
    pub async fn set_favorite(&self, id: i64, value: bool) -> Result<(), MutationError> {
        let owner = self.owner().ok_or_else(|| {
            MutationError::ValidationRejected("no user signed in".to_string())
        })?;
        let previous = {
            let mut state = self.state.lock().unwrap();
            let record = state
                .bookmarks
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| {
                    MutationError::ValidationRejected(format!("unknown bookmark id {}", id))
                })?;
            let previous = record.favorite;
            record.favorite = value;
            previous
        };

        let patch = BookmarkPatch::favorite(value);
        let remote = self.store.update_bookmark(id, &owner, &patch);
        let confirmed = self
            .reconcile(
                async move { remote.await.map(RemoteOutcome::Rows) },
                "Favorite update failed",
                move |state, row| {
                    if let Some(slot) = state.bookmarks.iter_mut().find(|b| b.id == id) {
                        slot.favorite = row.favorite;
                    }
                },
                move |state| {
                    if let Some(slot) = state.bookmarks.iter_mut().find(|b| b.id == id) {
                        slot.favorite = previous;
                    }
                },
            )
            .await?;
        confirmed.ok_or(MutationError::PolicyBlocked).map(|_| ())
    }

    /// Shared commit-or-rollback step: awaits the remote call, then either
    /// commits the first returned row, or rolls back and emits a notice.
    /// Zero rows from a row-returning call is an authorization block, kept
    /// distinct from a transport failure.
    async fn reconcile<F, C, R>(
        &self,
        remote: F,
        failure_notice: &str,
        commit: C,
        rollback: R,
    ) -> Result<Option<Bookmark>, MutationError>
    where
        F: Future<Output = Result<RemoteOutcome, StoreError>>,
        C: FnOnce(&mut ModelState, &Bookmark),
        R: FnOnce(&mut ModelState),
    {
        match remote.await {
            Ok(RemoteOutcome::Rows(rows)) => match rows.first() {
                Some(row) => {
                    let mut state = self.state.lock().unwrap();
                    commit(&mut *state, row);
                    Ok(Some(row.clone()))
                }
                None => {
                    warn!("mutation blocked by policy, rolling back");
                    let mut state = self.state.lock().unwrap();
                    rollback(&mut *state);
                    drop(state);
                    self.notify(Notice::blocked("Blocked by security policy"));
                    Err(MutationError::PolicyBlocked)
                }
            },
            Ok(RemoteOutcome::Done) => Ok(None),
            Err(e) => {
                warn!("mutation rolled back: {}", e);
                let mut state = self.state.lock().unwrap();
                rollback(&mut *state);
                drop(state);
                self.notify(Notice::error(failure_notice));
                Err(e.into())
            }
        }
    }

    // === Favorite gesture ===

    /// A single activation of the favorite control: schedules
    /// `favorite = true` after the debounce window, replacing any pending
    /// gesture for this record.
    pub fn favorite_clicked(&self, id: i64) {
        let Some(manager) = self.weak.upgrade() else {
            return;
        };
        self.timers.schedule(id, self.debounce_window, async move {
            if let Err(e) = manager.set_favorite(id, true).await {
                debug!("deferred favorite set dropped: {}", e);
            }
        });
    }

    /// A second activation inside the window: cancels the pending
    /// `favorite = true` and issues `favorite = false` immediately.
    pub async fn favorite_double_clicked(&self, id: i64) -> Result<(), MutationError> {
        self.timers.cancel(id);
        self.set_favorite(id, false).await
    }

    /// Whether a deferred favorite gesture is pending for the record.
    pub fn favorite_pending(&self, id: i64) -> bool {
        self.timers.is_pending(id)
    }

    // === Derived views & filters ===

    /// The bookmark sequence the presentation layer renders, computed from
    /// the collection and the current tag/view/search selection.
    pub fn visible_bookmarks(&self) -> Vec<Bookmark> {
        let state = self.state.lock().unwrap();
        filter_engine::derive_view(
            &state.bookmarks,
            &state.selected_tag,
            state.view_filter,
            &state.search,
            Utc::now(),
        )
    }

    /// Distinct effective tags over the full collection, `"All"` first.
    pub fn tag_inventory(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        filter_engine::tag_inventory(&state.bookmarks)
    }

    pub fn set_selected_tag(&self, tag: &str) {
        self.state.lock().unwrap().selected_tag = tag.to_string();
    }

    pub fn set_view_filter(&self, filter: ViewFilter) {
        self.state.lock().unwrap().view_filter = filter;
    }

    pub fn set_search(&self, search: &str) {
        self.state.lock().unwrap().search = search.to_string();
    }

    // === Read accessors ===

    pub fn owner(&self) -> Option<String> {
        self.state.lock().unwrap().owner.clone()
    }

    /// The full collection in its current order.
    pub fn all_bookmarks(&self) -> Vec<Bookmark> {
        self.state.lock().unwrap().bookmarks.clone()
    }

    pub fn is_saving(&self) -> bool {
        self.state.lock().unwrap().saving
    }

    pub fn selected_tag(&self) -> String {
        self.state.lock().unwrap().selected_tag.clone()
    }

    pub fn view_filter(&self) -> ViewFilter {
        self.state.lock().unwrap().view_filter
    }

    pub fn search(&self) -> String {
        self.state.lock().unwrap().search.clone()
    }
}
