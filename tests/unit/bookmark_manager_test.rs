//! Unit tests for the BookmarkManager reconciliation protocol.
//!
//! Every mutation is exercised through the public API against the in-memory
//! store: optimistic apply, commit on success, rollback on transport
//! failure, and the zero-affected-rows policy-block path. The store's call
//! log pins down exactly what remote traffic each flow produces.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use smartmark::managers::bookmark_manager::BookmarkManager;
use smartmark::services::memory_store::{MemoryStore, RecordedCall};
use smartmark::types::bookmark::{Bookmark, BookmarkPatch, ViewFilter};
use smartmark::types::errors::MutationError;
use smartmark::types::notice::{Notice, NoticeKind};
use tokio::sync::mpsc::UnboundedReceiver;

const TEST_DEBOUNCE: Duration = Duration::from_millis(40);
const PAST_DEBOUNCE: Duration = Duration::from_millis(160);

fn row(id: i64, title: &str, hours_old: i64) -> Bookmark {
    Bookmark {
        id,
        title: title.to_string(),
        url: format!("https://example.com/{}", id),
        tag: None,
        user_id: "alice".to_string(),
        created_at: Utc::now() - chrono::Duration::hours(hours_old),
        favorite: false,
        pinned: false,
        is_read: true,
        archived: false,
    }
}

/// Helper: a signed-in manager over a seeded in-memory store, with the
/// session resolved and the collection loaded.
async fn setup(
    rows: Vec<Bookmark>,
) -> (
    Arc<MemoryStore>,
    Arc<BookmarkManager>,
    UnboundedReceiver<Notice>,
) {
    let store = Arc::new(MemoryStore::with_user("alice"));
    store.seed(rows);
    let (manager, notices) = BookmarkManager::with_debounce_window(store.clone(), TEST_DEBOUNCE);
    manager.resolve_user().await.unwrap();
    manager.refresh().await.unwrap();
    (store, manager, notices)
}

fn favorite_updates(calls: &[RecordedCall], value: bool) -> usize {
    calls
        .iter()
        .filter(|call| {
            matches!(call, RecordedCall::Update { patch, .. } if patch.favorite == Some(value))
        })
        .count()
}

// === Create ===

/// A valid create gains exactly one server-confirmed record at the head of
/// the list, normalizes the url, defaults the blank tag, and switches the
/// view filter to Recent.
#[tokio::test]
async fn test_create_confirms_in_place() {
    let (_store, manager, mut notices) = setup(vec![row(1, "Existing", 2)]).await;

    let confirmed = manager.create("Crates", "crates.io", "  ").await.unwrap();
    assert!(confirmed.id > 0);
    assert_eq!(confirmed.url, "https://crates.io");
    assert_eq!(confirmed.tag.as_deref(), Some("General"));

    let all = manager.all_bookmarks();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, confirmed.id);
    assert_eq!(all[1].id, 1);
    assert!(!manager.is_saving());
    assert_eq!(manager.view_filter(), ViewFilter::Recent);

    assert_eq!(notices.try_recv().unwrap(), Notice::info("Bookmark added"));
}

/// A failed insert removes the provisional record, releases the guard, and
/// raises a transport failure notice.
#[tokio::test]
async fn test_create_rolls_back_on_failure() {
    let (store, manager, mut notices) = setup(vec![row(1, "Existing", 2)]).await;
    store.set_fail_inserts(true);

    let result = manager.create("Doomed", "doomed.example.com", "Work").await;
    assert!(matches!(result, Err(MutationError::TransportFailed(_))));

    let all = manager.all_bookmarks();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, 1);
    assert!(!manager.is_saving());

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.message, "Save failed");
}

/// Blank inputs are rejected before any remote call is made.
#[tokio::test]
async fn test_create_validation_rejects_blank_fields() {
    let (store, manager, _notices) = setup(vec![]).await;

    let no_title = manager.create("   ", "example.com", "").await;
    assert!(matches!(no_title, Err(MutationError::ValidationRejected(_))));

    let no_url = manager.create("Title", "   ", "").await;
    assert!(matches!(no_url, Err(MutationError::ValidationRejected(_))));

    assert!(!store
        .calls()
        .iter()
        .any(|call| matches!(call, RecordedCall::Insert { .. })));
}

/// Creating without a signed-in user is rejected locally.
#[tokio::test]
async fn test_create_requires_session() {
    let store = Arc::new(MemoryStore::new());
    let (manager, _notices) = BookmarkManager::new(store.clone());
    manager.resolve_user().await.unwrap();

    let result = manager.create("Title", "example.com", "").await;
    assert!(matches!(result, Err(MutationError::ValidationRejected(_))));
    assert!(store.calls().is_empty());
}

/// A second create while one is in flight is ignored: exactly one insert
/// reaches the store.
#[tokio::test]
async fn test_create_is_single_flight() {
    let (store, manager, _notices) = setup(vec![]).await;
    store.set_insert_delay(Duration::from_millis(80));

    let first = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.create("First", "first.example.com", "").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(manager.is_saving());

    let second = manager.create("Second", "second.example.com", "").await;
    assert!(matches!(second, Err(MutationError::ValidationRejected(_))));

    first.await.unwrap().unwrap();
    let inserts = store
        .calls()
        .iter()
        .filter(|call| matches!(call, RecordedCall::Insert { .. }))
        .count();
    assert_eq!(inserts, 1);
    assert_eq!(manager.all_bookmarks().len(), 1);
}

// === Update ===

#[tokio::test]
async fn test_update_adopts_server_row() {
    let (_store, manager, _notices) = setup(vec![row(1, "Old title", 2)]).await;

    let patch = BookmarkPatch {
        title: Some("New title".to_string()),
        ..BookmarkPatch::default()
    };
    let confirmed = manager.update(1, patch).await.unwrap();
    assert_eq!(confirmed.title, "New title");
    assert_eq!(manager.all_bookmarks()[0].title, "New title");
}

/// A transport failure restores the pre-update snapshot verbatim.
#[tokio::test]
async fn test_update_rolls_back_on_transport_failure() {
    let (store, manager, mut notices) = setup(vec![row(1, "Old title", 2)]).await;
    store.set_fail_updates(true);

    let patch = BookmarkPatch {
        title: Some("New title".to_string()),
        ..BookmarkPatch::default()
    };
    let result = manager.update(1, patch).await;
    assert!(matches!(result, Err(MutationError::TransportFailed(_))));
    assert_eq!(manager.all_bookmarks()[0].title, "Old title");

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.message, "Update failed");
}

/// Zero affected rows without a transport error rolls back and surfaces as
/// a policy block, not a transport failure.
#[tokio::test]
async fn test_update_zero_rows_is_policy_blocked() {
    let (store, manager, mut notices) = setup(vec![row(1, "Old title", 2)]).await;
    store.set_block_writes(true);

    let patch = BookmarkPatch {
        title: Some("New title".to_string()),
        ..BookmarkPatch::default()
    };
    let result = manager.update(1, patch).await;
    assert!(matches!(result, Err(MutationError::PolicyBlocked)));
    assert_eq!(manager.all_bookmarks()[0].title, "Old title");

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.kind, NoticeKind::Blocked);
}

#[tokio::test]
async fn test_update_unknown_id_rejected_locally() {
    let (store, manager, _notices) = setup(vec![row(1, "Only", 2)]).await;

    let result = manager.update(99, BookmarkPatch::default()).await;
    assert!(matches!(result, Err(MutationError::ValidationRejected(_))));
    assert!(!store
        .calls()
        .iter()
        .any(|call| matches!(call, RecordedCall::Update { .. })));
}

// === Delete ===

#[tokio::test]
async fn test_delete_removes_record() {
    let (_store, manager, mut notices) = setup(vec![row(1, "Keep", 2), row(2, "Drop", 1)]).await;

    manager.delete(2).await.unwrap();
    let ids: Vec<i64> = manager.all_bookmarks().iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(notices.try_recv().unwrap(), Notice::info("Deleted"));
}

#[tokio::test]
async fn test_delete_restores_snapshot_on_failure() {
    let (store, manager, mut notices) = setup(vec![row(1, "Keep", 2), row(2, "Drop", 1)]).await;
    store.set_fail_deletes(true);

    let result = manager.delete(2).await;
    assert!(matches!(result, Err(MutationError::TransportFailed(_))));

    let ids: Vec<i64> = manager.all_bookmarks().iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.message, "Delete failed");
}

// === Favorite ===

/// A single tap sets the flag after the debounce window elapses.
#[tokio::test]
async fn test_single_tap_sets_favorite_after_window() {
    let (store, manager, _notices) = setup(vec![row(5, "Starred later", 2)]).await;

    manager.favorite_clicked(5);
    assert!(manager.favorite_pending(5));
    assert!(!manager.all_bookmarks()[0].favorite);

    tokio::time::sleep(PAST_DEBOUNCE).await;
    assert!(manager.all_bookmarks()[0].favorite);
    assert_eq!(favorite_updates(&store.calls(), true), 1);
}

/// A second activation inside the window cancels the deferred set: no
/// `favorite = true` call is ever made, and exactly one `favorite = false`
/// call goes out.
#[tokio::test]
async fn test_double_tap_cancels_deferred_set() {
    let (store, manager, _notices) = setup(vec![row(5, "Unstarred", 2)]).await;

    manager.favorite_clicked(5);
    manager.favorite_double_clicked(5).await.unwrap();
    tokio::time::sleep(PAST_DEBOUNCE).await;

    let calls = store.calls();
    assert_eq!(favorite_updates(&calls, true), 0);
    assert_eq!(favorite_updates(&calls, false), 1);
    assert!(!manager.all_bookmarks()[0].favorite);
}

/// Gestures on different records run independently.
#[tokio::test]
async fn test_favorite_timers_are_keyed_per_record() {
    let (store, manager, _notices) = setup(vec![row(1, "One", 2), row(2, "Two", 1)]).await;

    manager.favorite_clicked(1);
    manager.favorite_clicked(2);
    manager.favorite_double_clicked(2).await.unwrap();
    tokio::time::sleep(PAST_DEBOUNCE).await;

    let by_id = |id: i64| {
        manager
            .all_bookmarks()
            .into_iter()
            .find(|b| b.id == id)
            .unwrap()
    };
    assert!(by_id(1).favorite);
    assert!(!by_id(2).favorite);
    assert_eq!(favorite_updates(&store.calls(), true), 1);
    assert_eq!(favorite_updates(&store.calls(), false), 1);
}

/// A blocked favorite write flips only that record's flag back; the rest of
/// the collection keeps its state.
#[tokio::test]
async fn test_favorite_rollback_is_scoped_to_the_record() {
    let (store, manager, mut notices) = setup(vec![row(1, "Blocked", 2), row(2, "Other", 1)]).await;

    let patch = BookmarkPatch {
        title: Some("Renamed".to_string()),
        ..BookmarkPatch::default()
    };
    manager.update(2, patch).await.unwrap();

    store.set_block_writes(true);
    let result = manager.set_favorite(1, true).await;
    assert!(matches!(result, Err(MutationError::PolicyBlocked)));

    let by_id = |id: i64| {
        manager
            .all_bookmarks()
            .into_iter()
            .find(|b| b.id == id)
            .unwrap()
    };
    assert!(!by_id(1).favorite);
    // The earlier rename of the other record survives the rollback.
    assert_eq!(by_id(2).title, "Renamed");

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.kind, NoticeKind::Blocked);
}

// === Session ===

/// Switching users clears the collection before anything is fetched for the
/// new owner.
#[tokio::test]
async fn test_switching_users_clears_collection() {
    let (store, manager, _notices) = setup(vec![row(1, "Alice's", 2)]).await;
    assert_eq!(manager.all_bookmarks().len(), 1);

    store.set_user(Some("bob"));
    let user = manager.resolve_user().await.unwrap();
    assert_eq!(user.as_deref(), Some("bob"));
    assert!(manager.all_bookmarks().is_empty());
    assert_eq!(manager.owner().as_deref(), Some("bob"));
}

#[tokio::test]
async fn test_sign_out_clears_all_state() {
    let (_store, manager, _notices) = setup(vec![row(1, "Alice's", 2)]).await;

    manager.sign_out().await.unwrap();
    assert!(manager.owner().is_none());
    assert!(manager.all_bookmarks().is_empty());
    assert!(!manager.is_saving());
}

/// A lost session (store reports no user) also clears local state.
#[tokio::test]
async fn test_lost_session_clears_collection() {
    let (store, manager, _notices) = setup(vec![row(1, "Alice's", 2)]).await;

    store.set_user(None);
    let user = manager.resolve_user().await.unwrap();
    assert!(user.is_none());
    assert!(manager.all_bookmarks().is_empty());
}
