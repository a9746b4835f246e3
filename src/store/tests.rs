//! Tests for PostStore

use super::*;
use crate::decode::{PostImage, RedditPost};
use crate::error::Error;
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn post(id: &str, title: &str, created: i64) -> RedditPost {
    RedditPost {
        id: id.to_string(),
        name: format!("t3_{id}"),
        title: title.to_string(),
        author: "shutterbug".to_string(),
        subreddit: "pics".to_string(),
        permalink: format!("/r/pics/comments/{id}/x/"),
        url: format!("https://i.redd.it/{id}.jpg"),
        domain: "i.redd.it".to_string(),
        created_utc: at(created),
        score: 10,
        num_comments: 2,
        over_18: false,
        flair: None,
        post_hint: Some("image".to_string()),
        is_gallery: false,
        images: vec![PostImage {
            url: format!("https://i.redd.it/{id}.jpg"),
            width: Some(640),
            height: Some(480),
        }],
    }
}

fn ids(posts: &[StoredPost]) -> Vec<&str> {
    posts.iter().map(StoredPost::id).collect()
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_store_new() {
    let store = PostStore::new("/tmp/gallery.json");
    assert!(!store.is_in_memory());
    assert_eq!(store.path().to_str().unwrap(), "/tmp/gallery.json");
}

#[test]
fn test_store_in_memory() {
    let store = PostStore::in_memory();
    assert!(store.is_in_memory());
}

#[tokio::test]
async fn test_from_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gallery.json");
    let store = PostStore::from_file(&path).unwrap();

    assert!(store.is_empty().await);
    assert!(store.last_poll().await.is_none());

    store.save().await.unwrap();
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["version"], GALLERY_VERSION);
}

#[test]
fn test_from_corrupt_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gallery.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = PostStore::from_file(&path);

    assert!(matches!(result, Err(Error::Store { .. })));
}

// ============================================================================
// Upsert Tests
// ============================================================================

#[tokio::test]
async fn test_upsert_counts_new_posts() {
    let store = PostStore::in_memory();

    let first = store
        .upsert_posts(vec![post("a", "A", 100), post("b", "B", 200)], at(1_000))
        .await
        .unwrap();
    let second = store
        .upsert_posts(vec![post("b", "B", 200), post("c", "C", 300)], at(2_000))
        .await
        .unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 1);
    assert_eq!(store.len().await, 3);
    assert!(store.contains("c").await);
    assert!(!store.contains("z").await);
}

#[tokio::test]
async fn test_upsert_refreshes_post_but_keeps_metadata() {
    let store = PostStore::in_memory();
    store
        .upsert_posts(vec![post("a", "Old title", 100)], at(1_000))
        .await
        .unwrap();
    store
        .update_metadata("a", &MetadataPatch::new().tag("sunset"), at(1_500))
        .await
        .unwrap();

    let mut refreshed = post("a", "New title", 100);
    refreshed.score = 999;
    store.upsert_posts(vec![refreshed], at(2_000)).await.unwrap();

    let stored = store.get("a").await.unwrap();
    assert_eq!(stored.post.title, "New title");
    assert_eq!(stored.post.score, 999);
    assert_eq!(stored.metadata.tags, vec!["sunset".to_string()]);
    assert_eq!(stored.first_seen, at(1_000));
}

// ============================================================================
// Metadata Tests
// ============================================================================

#[tokio::test]
async fn test_update_metadata() {
    let store = PostStore::in_memory();
    store
        .upsert_posts(vec![post("a", "Reddit title", 100)], at(1_000))
        .await
        .unwrap();

    let patch = MetadataPatch::new()
        .title("  Curated title ")
        .tag("Beach")
        .tag("beach")
        .tag("dusk")
        .hidden(true);
    let updated = store.update_metadata("a", &patch, at(5_000)).await.unwrap();

    assert_eq!(updated.display_title(), "Curated title");
    assert_eq!(updated.metadata.tags, vec!["beach", "dusk"]);
    assert!(updated.metadata.hidden);
    assert_eq!(updated.metadata.edited_at, Some(at(5_000)));
}

#[tokio::test]
async fn test_clear_then_set() {
    let store = PostStore::in_memory();
    store
        .upsert_posts(vec![post("a", "Reddit title", 100)], at(1_000))
        .await
        .unwrap();
    store
        .update_metadata(
            "a",
            &MetadataPatch::new().title("Mine").tag("one").tag("two"),
            at(2_000),
        )
        .await
        .unwrap();

    let updated = store
        .update_metadata(
            "a",
            &MetadataPatch::new().clear_title().clear_tags().tag("three"),
            at(3_000),
        )
        .await
        .unwrap();

    assert_eq!(updated.display_title(), "Reddit title");
    assert_eq!(updated.metadata.tags, vec!["three"]);
}

#[tokio::test]
async fn test_update_unknown_post() {
    let store = PostStore::in_memory();

    let result = store
        .update_metadata("ghost", &MetadataPatch::new().hidden(true), at(0))
        .await;

    match result {
        Err(Error::PostNotFound { id }) => assert_eq!(id, "ghost"),
        other => panic!("expected PostNotFound, got {other:?}"),
    }
}

#[test]
fn test_patch_is_empty() {
    assert!(MetadataPatch::new().is_empty());
    assert!(!MetadataPatch::new().clear_tags().is_empty());
    assert!(!MetadataPatch::new().hidden(false).is_empty());
}

// ============================================================================
// Remove Tests
// ============================================================================

#[tokio::test]
async fn test_remove() {
    let store = PostStore::in_memory();
    store
        .upsert_posts(vec![post("a", "A", 100)], at(1_000))
        .await
        .unwrap();

    let removed = store.remove("a").await.unwrap();
    assert_eq!(removed.id(), "a");
    assert!(store.is_empty().await);

    assert!(matches!(
        store.remove("a").await,
        Err(Error::PostNotFound { .. })
    ));
}

// ============================================================================
// Query Tests
// ============================================================================

async fn seeded_store() -> PostStore {
    let store = PostStore::in_memory();

    let mut nsfw = post("n", "Late night", 400);
    nsfw.over_18 = true;

    let mut flaired = post("f", "Mountain lake", 300);
    flaired.flair = Some("Landscape".to_string());
    flaired.author = "Alpinist".to_string();

    let tie_a = post("t1", "Tie one", 200);
    let tie_b = post("t2", "Tie two", 200);

    store
        .upsert_posts(
            vec![post("old", "Old harbour", 100), tie_b, flaired, nsfw, tie_a],
            at(1_000),
        )
        .await
        .unwrap();
    store
        .update_metadata("old", &MetadataPatch::new().tag("harbour"), at(1_100))
        .await
        .unwrap();
    store
        .update_metadata("t2", &MetadataPatch::new().hidden(true), at(1_100))
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_query_default_hides_hidden_and_nsfw() {
    let store = seeded_store().await;

    let posts = store.query(&PostQuery::new()).await;

    assert_eq!(ids(&posts), vec!["f", "t1", "old"]);
}

#[tokio::test]
async fn test_query_sorts_newest_first_with_id_tiebreak() {
    let store = seeded_store().await;

    let posts = store
        .query(&PostQuery::new().include_hidden(true).include_nsfw(true))
        .await;

    assert_eq!(ids(&posts), vec!["n", "f", "t1", "t2", "old"]);
}

#[tokio::test]
async fn test_query_filters() {
    let store = seeded_store().await;

    let by_flair = store.query(&PostQuery::new().flair("landscape")).await;
    assert_eq!(ids(&by_flair), vec!["f"]);

    let by_author = store.query(&PostQuery::new().author("ALPINIST")).await;
    assert_eq!(ids(&by_author), vec!["f"]);

    let by_tag = store.query(&PostQuery::new().tag("Harbour")).await;
    assert_eq!(ids(&by_tag), vec!["old"]);
}

#[tokio::test]
async fn test_query_search() {
    let store = seeded_store().await;

    // title
    assert_eq!(
        ids(&store.query(&PostQuery::new().search("LAKE")).await),
        vec!["f"]
    );
    // flair
    assert_eq!(
        ids(&store.query(&PostQuery::new().search("scape")).await),
        vec!["f"]
    );
    // tag
    assert_eq!(
        ids(&store.query(&PostQuery::new().search("harb")).await),
        vec!["old"]
    );
    // blank search matches everything visible
    assert_eq!(store.query(&PostQuery::new().search("  ")).await.len(), 3);
}

#[tokio::test]
async fn test_query_search_uses_title_override() {
    let store = seeded_store().await;
    store
        .update_metadata("t1", &MetadataPatch::new().title("Golden retriever"), at(2_000))
        .await
        .unwrap();

    assert_eq!(
        ids(&store.query(&PostQuery::new().search("retriever")).await),
        vec!["t1"]
    );
    assert!(store
        .query(&PostQuery::new().search("Tie one"))
        .await
        .is_empty());
}

#[tokio::test]
async fn test_query_window() {
    let store = seeded_store().await;
    let all = PostQuery::new().include_hidden(true).include_nsfw(true);

    let page = store.query(&all.clone().page(1, 2)).await;
    assert_eq!(ids(&page), vec!["f", "t1"]);

    let past_end = store.query(&all.page(10, 2)).await;
    assert!(past_end.is_empty());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("gallery.json");

    {
        let store = PostStore::from_file(&path).unwrap();
        store
            .upsert_posts(vec![post("a", "A", 100)], at(1_000))
            .await
            .unwrap();
        store
            .update_metadata("a", &MetadataPatch::new().tag("kept"), at(1_500))
            .await
            .unwrap();
        store.set_last_poll(at(2_000)).await.unwrap();
    }

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reopened = PostStore::from_file(&path).unwrap();
    let stored = reopened.get("a").await.unwrap();
    assert_eq!(stored.metadata.tags, vec!["kept"]);
    assert_eq!(reopened.last_poll().await, Some(at(2_000)));
}

#[tokio::test]
async fn test_without_auto_save_waits_for_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gallery.json");
    let store = PostStore::without_auto_save(&path);

    store
        .upsert_posts(vec![post("a", "A", 100)], at(1_000))
        .await
        .unwrap();
    assert!(!path.exists());

    store.save().await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_load_replaces_cached_gallery() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gallery.json");

    let writer = PostStore::new(&path);
    let reader = PostStore::without_auto_save(&path);

    writer
        .upsert_posts(vec![post("a", "A", 100)], at(1_000))
        .await
        .unwrap();
    assert!(reader.is_empty().await);

    reader.load().await.unwrap();
    assert!(reader.contains("a").await);
}

#[tokio::test]
async fn test_clone_shares_gallery() {
    let store = PostStore::in_memory();
    let clone = store.clone();

    store
        .upsert_posts(vec![post("a", "A", 100)], at(1_000))
        .await
        .unwrap();

    assert!(clone.contains("a").await);
}

#[tokio::test]
async fn test_in_memory_save_is_noop() {
    let store = PostStore::in_memory();
    store.save().await.unwrap();
    store.load().await.unwrap();
}
