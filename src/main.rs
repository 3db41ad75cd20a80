//! Smartmark — personal bookmark dashboard core.
//!
//! Entry point: runs a console demo over the in-memory store, walking the
//! session, the optimistic mutations, the derived views, and the favorite
//! gesture. Wire `App::new(&AppConfig::from_env()?)` instead to talk to a
//! live backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use smartmark::app::App;
use smartmark::services::memory_store::MemoryStore;
use smartmark::types::bookmark::{display_domain, Bookmark, BookmarkPatch, ViewFilter};

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn seeded(id: i64, title: &str, url: &str, tag: Option<&str>, days_old: i64) -> Bookmark {
    Bookmark {
        id,
        title: title.to_string(),
        url: url.to_string(),
        tag: tag.map(str::to_string),
        user_id: "demo-user".to_string(),
        created_at: Utc::now() - ChronoDuration::days(days_old),
        favorite: false,
        pinned: false,
        is_read: true,
        archived: false,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("smartmark=debug")
        .init();

    println!();
    println!("Smartmark v{} — Demo Mode", env!("CARGO_PKG_VERSION"));
    println!();

    let store = Arc::new(MemoryStore::with_user("demo-user"));
    store.seed(vec![
        seeded(1, "Rust Book", "https://doc.rust-lang.org/book", Some("Study"), 3),
        seeded(2, "UI inspirations", "https://dribbble.com", Some("Design"), 2),
        seeded(3, "Issue tracker", "https://github.com", None, 2),
    ]);
    let app = App::with_store(store.clone());
    let mut notices = app.notices;
    let bookmarks = app.bookmarks;

    section("Session");
    let user = bookmarks.resolve_user().await.expect("session lookup");
    println!("  Signed in as: {}", user.as_deref().unwrap_or("<none>"));
    bookmarks.refresh().await.expect("initial fetch");
    println!("  Loaded {} bookmarks", bookmarks.all_bookmarks().len());

    section("Create (optimistic insert, single-flight)");
    let created = bookmarks
        .create("Crates.io", "crates.io", "Study")
        .await
        .expect("create");
    println!(
        "  Confirmed id {} at {} ({})",
        created.id,
        created.created_at,
        display_domain(&created.url)
    );
    println!(
        "  Wire row: {}",
        serde_json::to_string(&created).expect("serialize row")
    );
    println!("  View filter switched to {:?}", bookmarks.view_filter());

    section("Derived views");
    bookmarks.set_view_filter(ViewFilter::All);
    println!("  Tag inventory: {:?}", bookmarks.tag_inventory());
    bookmarks.set_selected_tag("Study");
    let visible = bookmarks.visible_bookmarks();
    println!(
        "  Tag 'Study' → {:?}",
        visible.iter().map(|b| b.title.as_str()).collect::<Vec<_>>()
    );
    bookmarks.set_selected_tag("All");
    bookmarks.set_search("tracker");
    println!(
        "  Search 'tracker' → {:?}",
        bookmarks
            .visible_bookmarks()
            .iter()
            .map(|b| b.title.as_str())
            .collect::<Vec<_>>()
    );
    bookmarks.set_search("");
    bookmarks.set_view_filter(ViewFilter::Recent);
    println!(
        "  Recent → {:?}",
        bookmarks
            .visible_bookmarks()
            .iter()
            .map(|b| b.title.as_str())
            .collect::<Vec<_>>()
    );
    bookmarks.set_view_filter(ViewFilter::All);

    section("Favorite gesture (tap vs. double tap)");
    bookmarks.favorite_clicked(created.id);
    println!("  Single tap scheduled; pending = {}", bookmarks.favorite_pending(created.id));
    tokio::time::sleep(Duration::from_millis(300)).await;
    let starred = bookmarks
        .all_bookmarks()
        .into_iter()
        .find(|b| b.id == created.id)
        .map(|b| b.favorite);
    println!("  After the window: favorite = {:?}", starred);
    bookmarks.favorite_clicked(created.id);
    bookmarks
        .favorite_double_clicked(created.id)
        .await
        .expect("double tap");
    println!(
        "  Double tap canceled the pending set and cleared the flag: {:?}",
        bookmarks
            .all_bookmarks()
            .into_iter()
            .find(|b| b.id == created.id)
            .map(|b| b.favorite)
    );

    section("Policy block (zero affected rows)");
    store.set_block_writes(true);
    let blocked = bookmarks
        .update(created.id, BookmarkPatch {
            title: Some("Renamed".to_string()),
            ..BookmarkPatch::default()
        })
        .await;
    println!("  Update outcome: {}", blocked.unwrap_err());
    println!(
        "  Title rolled back to: {:?}",
        bookmarks
            .all_bookmarks()
            .into_iter()
            .find(|b| b.id == created.id)
            .map(|b| b.title)
    );
    store.set_block_writes(false);

    section("Delete");
    bookmarks.delete(created.id).await.expect("delete");
    println!("  {} bookmarks remain", bookmarks.all_bookmarks().len());

    section("Notices");
    while let Ok(notice) = notices.try_recv() {
        println!("  [{:?}] {}", notice.kind, notice.message);
    }

    println!();
    println!("Demo complete.");
}
