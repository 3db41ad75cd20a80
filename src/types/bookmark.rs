use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display/grouping category used when a bookmark has no tag.
pub const GENERAL_TAG: &str = "General";

/// Pseudo-tag selecting every category in filters and the tag inventory.
pub const ALL_TAG: &str = "All";

/// Represents a saved bookmark row.
///
/// `id` is assigned by the backend; negative values are temporary keys for
/// records created locally and not yet confirmed. `pinned`, `is_read` and
/// `archived` are reserved columns on the relation that the core carries
/// through but never reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub tag: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub archived: bool,
}

impl Bookmark {
    /// The tag used for grouping, filtering and display: the stored tag when
    /// it is non-blank, otherwise `"General"`.
    pub fn effective_tag(&self) -> &str {
        match &self.tag {
            Some(t) if !t.trim().is_empty() => t,
            _ => GENERAL_TAG,
        }
    }
}

/// Insert payload for a new bookmark. The backend assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub tag: Option<String>,
    pub user_id: String,
    pub favorite: bool,
    pub pinned: bool,
    pub is_read: bool,
    pub archived: bool,
}

impl NewBookmark {
    /// Builds an insert payload with the reserved-column defaults the
    /// dashboard writes (`is_read` starts true, everything else false).
    pub fn new(title: &str, url: &str, tag: Option<&str>, user_id: &str) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            tag: tag.map(str::to_string),
            user_id: user_id.to_string(),
            favorite: false,
            pinned: false,
            is_read: true,
            archived: false,
        }
    }
}

/// Partial update for an existing bookmark. `None` fields are omitted from
/// the wire payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
}

impl BookmarkPatch {
    /// A patch touching only the favorite flag.
    pub fn favorite(value: bool) -> Self {
        Self {
            favorite: Some(value),
            ..Self::default()
        }
    }

    /// Applies the present fields to a record in place.
    pub fn apply_to(&self, bookmark: &mut Bookmark) {
        if let Some(title) = &self.title {
            bookmark.title = title.clone();
        }
        if let Some(url) = &self.url {
            bookmark.url = url.clone();
        }
        if let Some(tag) = &self.tag {
            bookmark.tag = Some(tag.clone());
        }
        if let Some(favorite) = self.favorite {
            bookmark.favorite = favorite;
        }
    }
}

/// View filter selected in the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewFilter {
    All,
    /// Records created within the last 24 hours.
    Recent,
    Favorites,
}

/// Trims a URL entered by the user and prefixes `https://` when no scheme is
/// present. Empty input stays empty; schemed input is returned unchanged.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }
    format!("https://{}", trimmed)
}

/// Host of the given URL with a leading `www.` stripped, for compact display.
/// Falls back to the raw input when it does not parse as a URL.
pub fn display_domain(link: &str) -> String {
    match url::Url::parse(link) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
            None => link.to_string(),
        },
        Err(_) => link.to_string(),
    }
}
