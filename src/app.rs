//! App Core for Smartmark.
//!
//! Central struct wiring the remote store client and the bookmark manager,
//! configured from the environment.

use std::env;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::managers::bookmark_manager::BookmarkManager;
use crate::services::remote_store::RemoteStore;
use crate::services::supabase_store::SupabaseStore;
use crate::types::errors::StoreError;
use crate::types::notice::Notice;

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_access_token: String,
}

impl AppConfig {
    /// Reads the configuration from the environment (`SUPABASE_URL`,
    /// `SUPABASE_ANON_KEY`, `SUPABASE_ACCESS_TOKEN`). Call
    /// `dotenvy::dotenv()` first to pick up a local `.env` file.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            supabase_url: env::var("SUPABASE_URL")
                .map_err(|_| "SUPABASE_URL is not set")?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .map_err(|_| "SUPABASE_ANON_KEY is not set")?,
            supabase_access_token: env::var("SUPABASE_ACCESS_TOKEN")
                .map_err(|_| "SUPABASE_ACCESS_TOKEN is not set")?,
        })
    }
}

/// Central application struct holding the store client, the bookmark
/// manager, and the notice stream the presentation layer drains.
pub struct App {
    pub store: Arc<dyn RemoteStore>,
    pub bookmarks: Arc<BookmarkManager>,
    pub notices: UnboundedReceiver<Notice>,
}

impl App {
    /// Creates an App talking to the configured hosted backend.
    pub fn new(config: &AppConfig) -> Self {
        let store: Arc<dyn RemoteStore> = Arc::new(SupabaseStore::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            &config.supabase_access_token,
        ));
        Self::with_store(store)
    }

    /// Creates an App over any store implementation (demo binary, tests).
    pub fn with_store(store: Arc<dyn RemoteStore>) -> Self {
        let (bookmarks, notices) = BookmarkManager::new(store.clone());
        Self {
            store,
            bookmarks,
            notices,
        }
    }

    /// Startup sequence: resolve the session and, when a user is signed in,
    /// load their bookmarks. Returns whether a session is active.
    pub async fn startup(&self) -> Result<bool, StoreError> {
        match self.bookmarks.resolve_user().await? {
            Some(_) => {
                self.bookmarks.refresh().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
