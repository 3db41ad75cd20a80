//! Supabase-backed remote store for Smartmark.
//!
//! Talks to the hosted backend over HTTPS: GoTrue for the session identity
//! and PostgREST for the `bookmarks` relation. Row-level security on the
//! backend is the authorization boundary; this client only scopes requests
//! by owner and reports what the backend returns.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::types::bookmark::{Bookmark, BookmarkPatch, NewBookmark};
use crate::types::errors::StoreError;
use crate::types::user::AuthUser;

use super::remote_store::RemoteStore;

const BOOKMARKS_TABLE: &str = "bookmarks";

/// Remote store implementation over the Supabase REST surface.
pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: String,
}

impl SupabaseStore {
    /// Creates a client for the given project.
    ///
    /// `access_token` is the user's session JWT; the anon key alone only
    /// reaches rows the backend's policies expose publicly.
    pub fn new(base_url: &str, anon_key: &str, access_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, BOOKMARKS_TABLE)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, endpoint)
    }

    /// Attaches the project key and bearer token every endpoint expects.
    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
    }

    /// Decodes a JSON body, mapping failures to `StoreError::Decode`.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Maps a non-success response to `StoreError::Api` with the status and
    /// whatever body the backend attached.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api(format!("{}: {}", status, body)))
    }
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn current_user(&self) -> Result<Option<AuthUser>, StoreError> {
        let response = self
            .with_auth(self.http.get(self.auth_url("user")))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        // An expired or missing session is "no user", not a hard error.
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        let user: AuthUser = Self::decode(response).await?;
        Ok(Some(user))
    }

    async fn list_bookmarks(&self, owner: &str) -> Result<Vec<Bookmark>, StoreError> {
        let owner_filter = format!("eq.{}", owner);
        let response = self
            .with_auth(self.http.get(self.table_url()))
            .query(&[
                ("select", "*"),
                ("user_id", owner_filter.as_str()),
                ("order", "created_at.desc"),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn insert_bookmark(&self, record: &NewBookmark) -> Result<Bookmark, StoreError> {
        let response = self
            .with_auth(self.http.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let mut rows: Vec<Bookmark> = Self::decode(response).await?;
        rows.pop()
            .ok_or_else(|| StoreError::Decode("insert returned no representation".to_string()))
    }

    async fn update_bookmark(
        &self,
        id: i64,
        owner: &str,
        patch: &BookmarkPatch,
    ) -> Result<Vec<Bookmark>, StoreError> {
        let id_filter = format!("eq.{}", id);
        let owner_filter = format!("eq.{}", owner);
        let response = self
            .with_auth(self.http.patch(self.table_url()))
            .query(&[
                ("id", id_filter.as_str()),
                ("user_id", owner_filter.as_str()),
            ])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        // Zero affected rows comes back as an empty representation, which is
        // how a policy rejection is distinguished from a transport error.
        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn delete_bookmark(&self, id: i64, owner: &str) -> Result<(), StoreError> {
        let id_filter = format!("eq.{}", id);
        let owner_filter = format!("eq.{}", owner);
        let response = self
            .with_auth(self.http.delete(self.table_url()))
            .query(&[
                ("id", id_filter.as_str()),
                ("user_id", owner_filter.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), StoreError> {
        let response = self
            .with_auth(self.http.post(self.auth_url("logout")))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }
}
