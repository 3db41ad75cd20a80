//! In-memory remote store for Smartmark.
//!
//! Backs the demo binary and the test suite: behaves like the hosted table
//! API (server-assigned ids and timestamps, owner scoping, newest-first
//! listing) and records every call so tests can assert on the exact remote
//! traffic. Failure knobs simulate transport errors; `block_writes`
//! simulates a row-level policy rejection (updates return zero rows).

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::types::bookmark::{Bookmark, BookmarkPatch, NewBookmark};
use crate::types::errors::StoreError;
use crate::types::user::AuthUser;

use super::remote_store::RemoteStore;

/// One remote call as observed by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    List { owner: String },
    Insert { title: String },
    Update { id: i64, patch: BookmarkPatch },
    Delete { id: i64 },
    SignOut,
}

#[derive(Default)]
struct MemoryInner {
    rows: Vec<Bookmark>,
    next_id: i64,
    user: Option<AuthUser>,
    calls: Vec<RecordedCall>,
    fail_inserts: bool,
    fail_updates: bool,
    fail_deletes: bool,
    block_writes: bool,
    insert_delay: Option<Duration>,
}

/// In-memory implementation of [`RemoteStore`].
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                next_id: 1,
                ..MemoryInner::default()
            }),
        }
    }

    /// A store with an active session for `user_id`.
    pub fn with_user(user_id: &str) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().user = Some(AuthUser {
            id: user_id.to_string(),
            email: None,
        });
        store
    }

    /// Inserts rows directly, bypassing the call log. Ids must be unique.
    pub fn seed(&self, rows: Vec<Bookmark>) {
        let mut inner = self.inner.lock().unwrap();
        let max_id = rows.iter().map(|r| r.id).max().unwrap_or(0);
        if max_id >= inner.next_id {
            inner.next_id = max_id + 1;
        }
        inner.rows.extend(rows);
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.inner.lock().unwrap().fail_inserts = fail;
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.inner.lock().unwrap().fail_updates = fail;
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_deletes = fail;
    }

    /// When set, updates succeed at the transport level but affect zero rows,
    /// mirroring a row-level security rejection.
    pub fn set_block_writes(&self, block: bool) {
        self.inner.lock().unwrap().block_writes = block;
    }

    /// Replaces the active session (None signs the user out server-side).
    pub fn set_user(&self, user_id: Option<&str>) {
        self.inner.lock().unwrap().user = user_id.map(|id| AuthUser {
            id: id.to_string(),
            email: None,
        });
    }

    /// Adds artificial latency to inserts so tests can observe in-flight
    /// creates.
    pub fn set_insert_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().insert_delay = Some(delay);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// The rows currently held, newest first.
    pub fn rows(&self) -> Vec<Bookmark> {
        let mut rows = self.inner.lock().unwrap().rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn current_user(&self) -> Result<Option<AuthUser>, StoreError> {
        Ok(self.inner.lock().unwrap().user.clone())
    }

    async fn list_bookmarks(&self, owner: &str) -> Result<Vec<Bookmark>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall::List {
            owner: owner.to_string(),
        });
        let mut rows: Vec<Bookmark> = inner
            .rows
            .iter()
            .filter(|r| r.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_bookmark(&self, record: &NewBookmark) -> Result<Bookmark, StoreError> {
        let delay = self.inner.lock().unwrap().insert_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall::Insert {
            title: record.title.clone(),
        });
        if inner.fail_inserts {
            return Err(StoreError::Api("insert rejected".to_string()));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let row = Bookmark {
            id,
            title: record.title.clone(),
            url: record.url.clone(),
            tag: record.tag.clone(),
            user_id: record.user_id.clone(),
            created_at: Utc::now(),
            favorite: record.favorite,
            pinned: record.pinned,
            is_read: record.is_read,
            archived: record.archived,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn update_bookmark(
        &self,
        id: i64,
        owner: &str,
        patch: &BookmarkPatch,
    ) -> Result<Vec<Bookmark>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall::Update {
            id,
            patch: patch.clone(),
        });
        if inner.fail_updates {
            return Err(StoreError::Api("update rejected".to_string()));
        }
        if inner.block_writes {
            return Ok(Vec::new());
        }
        let row = inner
            .rows
            .iter_mut()
            .find(|r| r.id == id && r.user_id == owner);
        match row {
            Some(row) => {
                patch.apply_to(row);
                Ok(vec![row.clone()])
            }
            // Unknown id behaves like a policy rejection: zero affected rows.
            None => Ok(Vec::new()),
        }
    }

    async fn delete_bookmark(&self, id: i64, owner: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall::Delete { id });
        if inner.fail_deletes {
            return Err(StoreError::Api("delete rejected".to_string()));
        }
        inner.rows.retain(|r| r.id != id || r.user_id != owner);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall::SignOut);
        inner.user = None;
        Ok(())
    }
}
