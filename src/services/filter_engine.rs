//! Derived-view computation for Smartmark.
//!
//! Pure functions from the full bookmark collection and the current filter
//! inputs to the sequence the presentation layer renders. Application order
//! is fixed: tag filter, then view filter, then text search. The evaluation
//! time is an argument so recomputing with unchanged inputs always yields an
//! identical sequence.

use chrono::{DateTime, Duration, Utc};

use crate::types::bookmark::{Bookmark, ViewFilter, ALL_TAG};

/// Recent-window size for [`ViewFilter::Recent`].
const RECENT_WINDOW_HOURS: i64 = 24;

/// How many records the Recent view falls back to when nothing in the
/// tag-filtered list is inside the window.
const RECENT_FALLBACK_COUNT: usize = 6;

/// Computes the visible bookmark sequence for the given filter inputs.
pub fn derive_view(
    bookmarks: &[Bookmark],
    selected_tag: &str,
    view_filter: ViewFilter,
    search: &str,
    now: DateTime<Utc>,
) -> Vec<Bookmark> {
    let mut list: Vec<Bookmark> = if selected_tag == ALL_TAG {
        bookmarks.to_vec()
    } else {
        bookmarks
            .iter()
            .filter(|b| b.effective_tag() == selected_tag)
            .cloned()
            .collect()
    };

    match view_filter {
        ViewFilter::Recent => {
            let window = Duration::hours(RECENT_WINDOW_HOURS);
            let recent: Vec<Bookmark> = list
                .iter()
                .filter(|b| now.signed_duration_since(b.created_at) <= window)
                .cloned()
                .collect();
            // Rather than an empty view, fall back to the head of the
            // tag-filtered list in its current order.
            if recent.is_empty() {
                list.truncate(RECENT_FALLBACK_COUNT);
            } else {
                list = recent;
            }
        }
        ViewFilter::Favorites => list.retain(|b| b.favorite),
        ViewFilter::All => {}
    }

    let needle = search.trim().to_lowercase();
    if !needle.is_empty() {
        list.retain(|b| {
            let haystack = format!("{} {} {}", b.title, b.url, b.effective_tag()).to_lowercase();
            haystack.contains(&needle)
        });
    }

    list
}

/// The distinct effective tags across the full collection, `"All"` first,
/// then first-occurrence order. Duplicates collapse.
pub fn tag_inventory(bookmarks: &[Bookmark]) -> Vec<String> {
    let mut tags = vec![ALL_TAG.to_string()];
    for bookmark in bookmarks {
        let tag = bookmark.effective_tag();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
