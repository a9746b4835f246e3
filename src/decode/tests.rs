//! Tests for decoder module

use super::*;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use test_case::test_case;

fn listing(after: Option<&str>, dist: u64, children: Vec<Value>) -> Value {
    json!({
        "kind": "Listing",
        "data": {
            "before": null,
            "after": after,
            "dist": dist,
            "children": children,
        }
    })
}

/// WARN-and-above log lines emitted on this thread while the guard lives
struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl CapturedLogs {
    fn start() -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || LogSink(Arc::clone(&sink)))
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        Self {
            buffer,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    fn lines(&self) -> Vec<String> {
        let bytes = self.buffer.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

struct LogSink(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn link(id: &str, url: &str) -> Value {
    json!({
        "kind": "t3",
        "data": {
            "id": id,
            "name": format!("t3_{id}"),
            "title": format!("Post {id}"),
            "author": "photographer",
            "subreddit": "EarthPorn",
            "permalink": format!("/r/EarthPorn/comments/{id}/post/"),
            "url": url,
            "domain": "i.redd.it",
            "created_utc": 1_700_000_000.0,
            "score": 42,
            "num_comments": 3,
            "over_18": false,
            "link_flair_text": "OC",
        }
    })
}

#[derive(Debug, Deserialize, PartialEq)]
struct Numbered {
    n: u32,
}

// ============================================================================
// Listing Envelope Tests
// ============================================================================

#[test]
fn test_decode_listing_basic() {
    let raw = listing(
        Some("t3_c"),
        3,
        vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})],
    );

    let page = decode_listing(&raw, &SerdeDecoder::<Numbered>::new()).unwrap();

    assert_eq!(page.before, None);
    assert_eq!(page.after, Some("t3_c".to_string()));
    assert_eq!(page.dist, 3);
    assert_eq!(
        page.children,
        vec![Numbered { n: 1 }, Numbered { n: 2 }, Numbered { n: 3 }]
    );
    assert!(page.has_next());
}

#[test]
fn test_decode_listing_absent_cursors() {
    let raw = json!({
        "kind": "Listing",
        "data": { "dist": 0, "children": [] }
    });

    let page = decode_listing(&raw, &SerdeDecoder::<Numbered>::new()).unwrap();

    assert_eq!(page.after, None);
    assert_eq!(page.before, None);
    assert!(page.children.is_empty());
    assert!(!page.has_next());
}

#[test]
fn test_decode_listing_drops_failed_child_and_keeps_order() {
    let raw = listing(
        None,
        4,
        vec![
            json!({"n": 1}),
            json!({"n": 2}),
            json!({"n": "not a number"}),
            json!({"n": 4}),
        ],
    );

    let decoded = decode_listing_detailed(&raw, &SerdeDecoder::<Numbered>::new()).unwrap();

    assert_eq!(
        decoded.listing.children,
        vec![Numbered { n: 1 }, Numbered { n: 2 }, Numbered { n: 4 }]
    );
    assert_eq!(decoded.skipped.len(), 1);
    assert_eq!(decoded.skipped[0].0, 2);
    // dist is reported by the API, not recomputed
    assert_eq!(decoded.listing.dist, 4);
}

#[test]
fn test_decode_listing_warns_once_per_dropped_child() {
    let raw = listing(
        None,
        3,
        vec![json!({"n": 1}), json!({"n": "bad"}), json!({"n": 3})],
    );

    let logs = CapturedLogs::start();
    let page = decode_listing(&raw, &SerdeDecoder::<Numbered>::new()).unwrap();
    let lines = logs.lines();

    assert_eq!(page.children, vec![Numbered { n: 1 }, Numbered { n: 3 }]);
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains("WARN"));
    assert!(lines[0].contains("index=1"));
}

#[test]
fn test_decode_listing_clean_page_is_silent() {
    let raw = listing(None, 2, vec![json!({"n": 1}), json!({"n": 2})]);

    let logs = CapturedLogs::start();
    decode_listing(&raw, &SerdeDecoder::<Numbered>::new()).unwrap();

    assert!(logs.lines().is_empty());
}

#[test]
fn test_decode_listing_all_children_fail() {
    let raw = listing(Some("next"), 2, vec![json!(1), json!(2)]);

    let decoded = decode_listing_detailed(&raw, &SerdeDecoder::<Numbered>::new()).unwrap();

    assert!(decoded.listing.children.is_empty());
    assert_eq!(
        decoded.skipped.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert_eq!(decoded.listing.after, Some("next".to_string()));
}

#[test_case(json!({"data": {"dist": 0, "children": []}}), "kind" ; "missing kind")]
#[test_case(json!({"kind": "t3", "data": {}}), "kind" ; "wrong kind")]
#[test_case(json!({"kind": "Listing"}), "data" ; "missing data")]
#[test_case(json!({"kind": "Listing", "data": []}), "data" ; "data not object")]
#[test_case(json!({"kind": "Listing", "data": {"children": []}}), "data.dist" ; "missing dist")]
#[test_case(json!({"kind": "Listing", "data": {"dist": "3", "children": []}}), "data.dist" ; "dist not number")]
#[test_case(json!({"kind": "Listing", "data": {"dist": 0}}), "data.children" ; "missing children")]
#[test_case(json!({"kind": "Listing", "data": {"dist": 0, "children": {}}}), "data.children" ; "children not array")]
#[test_case(json!({"kind": "Listing", "data": {"dist": 0, "after": 5, "children": []}}), "data.after" ; "after not string")]
#[test_case(json!({"kind": "Listing", "data": {"dist": 0, "before": true, "children": []}}), "data.before" ; "before not string")]
fn test_decode_listing_rejects_bad_envelope(raw: Value, path: &str) {
    let err = decode_listing(&raw, &SerdeDecoder::<Numbered>::new()).unwrap_err();
    assert_eq!(err.path, path);
}

#[test]
fn test_decode_fn_closure_decoder() {
    let raw = listing(None, 2, vec![json!("a"), json!(7)]);
    let decoder = decode_fn(|v: &Value| {
        v.as_str()
            .map(str::to_uppercase)
            .ok_or_else(|| DecodeError::invalid("$", "a string"))
    });

    let page = decode_listing(&raw, &decoder).unwrap();

    assert_eq!(page.children, vec!["A".to_string()]);
}

#[test]
fn test_listing_map_keeps_cursors() {
    let page = Listing {
        before: Some("b".to_string()),
        after: Some("a".to_string()),
        dist: 2,
        children: vec![1, 2],
    };

    let mapped = page.map(|n| n * 10);

    assert_eq!(mapped.children, vec![10, 20]);
    assert_eq!(mapped.after, Some("a".to_string()));
    assert_eq!(mapped.before, Some("b".to_string()));
    assert_eq!(mapped.dist, 2);
}

#[test]
fn test_decode_error_display() {
    let err = DecodeError::invalid("data.dist", "a non-negative integer");
    assert_eq!(err.to_string(), "data.dist: expected a non-negative integer");
    assert_eq!(
        DecodeError::missing("kind").to_string(),
        "kind: missing required field"
    );
}

// ============================================================================
// Post Decoder Tests
// ============================================================================

#[test_case(1_700_000_000.25, 1_700_000_000_250 ; "fractional")]
#[test_case(-1.5, -1_500 ; "negative fractional")]
#[test_case(0.0, 0 ; "epoch")]
fn test_post_decoder_created_utc(created: f64, expected_millis: i64) {
    let mut raw = link("abc", "https://i.redd.it/abc.jpg");
    raw["data"]["created_utc"] = json!(created);

    let post = RedditPostDecoder::new().decode(&raw).unwrap();

    assert_eq!(post.created_utc.timestamp_millis(), expected_millis);
}

#[test]
fn test_post_decoder_direct_image() {
    let raw = link("abc", "https://i.redd.it/abc.jpg");

    let post = RedditPostDecoder::new().decode(&raw).unwrap();

    assert_eq!(post.id, "abc");
    assert_eq!(post.name, "t3_abc");
    assert_eq!(post.author, "photographer");
    assert_eq!(post.flair, Some("OC".to_string()));
    assert_eq!(post.score, 42);
    assert_eq!(post.created_utc.timestamp(), 1_700_000_000);
    assert!(post.is_image_post());
    assert_eq!(
        post.cover_image().map(|i| i.url.as_str()),
        Some("https://i.redd.it/abc.jpg")
    );
    assert_eq!(
        post.permalink_url(),
        "https://www.reddit.com/r/EarthPorn/comments/abc/post/"
    );
}

#[test]
fn test_post_decoder_direct_image_uses_preview_dimensions() {
    let mut raw = link("abc", "https://i.redd.it/abc.png");
    raw["data"]["preview"] = json!({
        "images": [{ "source": { "url": "https://preview.redd.it/abc.png?width=4000&amp;s=x", "width": 4000, "height": 3000 } }]
    });

    let post = RedditPostDecoder::new().decode(&raw).unwrap();

    assert_eq!(
        post.images,
        vec![PostImage {
            url: "https://i.redd.it/abc.png".to_string(),
            width: Some(4000),
            height: Some(3000),
        }]
    );
}

#[test]
fn test_post_decoder_preview_fallback_unescapes_url() {
    let mut raw = link("xyz", "https://imgur.com/gallery/xyz");
    raw["data"]["post_hint"] = json!("image");
    raw["data"]["preview"] = json!({
        "images": [{ "source": { "url": "https://preview.redd.it/xyz.jpg?width=640&amp;s=abc", "width": 640, "height": 480 } }]
    });

    let post = RedditPostDecoder::new().decode(&raw).unwrap();

    assert_eq!(post.images.len(), 1);
    assert_eq!(
        post.images[0].url,
        "https://preview.redd.it/xyz.jpg?width=640&s=abc"
    );
}

#[test]
fn test_post_decoder_gallery_in_item_order() {
    let mut raw = link("gal", "https://www.reddit.com/gallery/gal");
    raw["data"]["is_gallery"] = json!(true);
    raw["data"]["gallery_data"] = json!({
        "items": [{"media_id": "m2"}, {"media_id": "m1"}, {"media_id": "gone"}, {"media_id": "m3"}]
    });
    raw["data"]["media_metadata"] = json!({
        "m1": {"status": "valid", "s": {"u": "https://preview.redd.it/m1.jpg?a=1&amp;b=2", "x": 100, "y": 50}},
        "m2": {"status": "valid", "s": {"gif": "https://i.redd.it/m2.gif", "x": 10, "y": 10}},
        "m3": {"status": "failed"},
    });

    let post = RedditPostDecoder::new().decode(&raw).unwrap();

    assert!(post.is_gallery);
    assert_eq!(
        post.images.iter().map(|i| i.url.as_str()).collect::<Vec<_>>(),
        vec![
            "https://i.redd.it/m2.gif",
            "https://preview.redd.it/m1.jpg?a=1&b=2"
        ]
    );
}

#[test]
fn test_post_decoder_text_post_has_no_images() {
    let mut raw = link("self", "https://www.reddit.com/r/EarthPorn/comments/self/post/");
    raw["data"]["post_hint"] = json!("self");
    raw["data"]["link_flair_text"] = json!("");

    let post = RedditPostDecoder::new().decode(&raw).unwrap();

    assert!(!post.is_image_post());
    assert_eq!(post.flair, None);
}

#[test]
fn test_post_decoder_rejects_wrong_kind() {
    let mut raw = link("abc", "https://i.redd.it/abc.jpg");
    raw["kind"] = json!("t1");

    let err = RedditPostDecoder::new().decode(&raw).unwrap_err();

    assert_eq!(err.path, "kind");
}

#[test]
fn test_post_decoder_rejects_missing_field() {
    let mut raw = link("abc", "https://i.redd.it/abc.jpg");
    raw["data"].as_object_mut().unwrap().remove("title");

    let err = RedditPostDecoder::new().decode(&raw).unwrap_err();

    assert_eq!(err.path, "data");
    assert!(err.message.contains("title"));
}

#[test]
fn test_post_decoder_inside_listing() {
    let raw = listing(
        Some("t3_b"),
        3,
        vec![
            link("a", "https://i.redd.it/a.jpg"),
            json!({"kind": "t3", "data": {"id": "broken"}}),
            link("b", "https://i.redd.it/b.webp"),
        ],
    );

    let page = decode_listing(&raw, &RedditPostDecoder::new()).unwrap();

    assert_eq!(
        page.children.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );
}

#[test_case("https://i.redd.it/abc.jpg", true ; "jpg")]
#[test_case("https://i.redd.it/abc.JPEG", true ; "uppercase jpeg")]
#[test_case("https://i.imgur.com/abc.png?1", true ; "png with query")]
#[test_case("https://i.redd.it/abc.webp", true ; "webp")]
#[test_case("https://i.imgur.com/abc.gifv", false ; "gifv is video")]
#[test_case("https://www.reddit.com/gallery/abc", false ; "gallery page")]
#[test_case("not a url.jpg", false ; "unparseable")]
fn test_is_image_url(url: &str, expected: bool) {
    assert_eq!(is_image_url(url), expected);
}
