//! Remote store contract for Smartmark.
//!
//! The hosted backend owns authentication, persistence and row-level
//! authorization; this trait is the full surface the core consumes. All
//! implementations scope every table operation to an owner id.

use async_trait::async_trait;

use crate::types::bookmark::{Bookmark, BookmarkPatch, NewBookmark};
use crate::types::errors::StoreError;
use crate::types::user::AuthUser;

/// Trait defining the remote table backend operations.
///
/// `update_bookmark` returns the affected rows rather than a single record:
/// an `Ok` result with zero rows means the backend's authorization policy
/// silently rejected the write, which callers must treat differently from a
/// transport error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The currently authenticated user, if a session is active.
    async fn current_user(&self) -> Result<Option<AuthUser>, StoreError>;

    /// All bookmarks owned by `owner`, newest first.
    async fn list_bookmarks(&self, owner: &str) -> Result<Vec<Bookmark>, StoreError>;

    /// Inserts a record and returns the server-confirmed row with its
    /// assigned id and timestamp.
    async fn insert_bookmark(&self, record: &NewBookmark) -> Result<Bookmark, StoreError>;

    /// Applies a partial update to the record with `id` owned by `owner` and
    /// returns the affected rows (empty when the policy blocked the write).
    async fn update_bookmark(
        &self,
        id: i64,
        owner: &str,
        patch: &BookmarkPatch,
    ) -> Result<Vec<Bookmark>, StoreError>;

    /// Deletes the record with `id` owned by `owner`.
    async fn delete_bookmark(&self, id: i64, owner: &str) -> Result<(), StoreError>;

    /// Ends the active session.
    async fn sign_out(&self) -> Result<(), StoreError>;
}
