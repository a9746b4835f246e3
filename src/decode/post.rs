//! Reddit link (`t3`) decoding
//!
//! Turns a listing child into a [`RedditPost`] and works out which images the
//! post carries: gallery items, a direct image link, or the preview source.

use super::types::{DecodeError, ItemDecoder};
use crate::types::OptionStringExt;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

const LINK_KIND: &str = "t3";

/// Matches paths that point straight at an image file
static IMAGE_PATH_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpe?g|png|gif|webp)$").ok());

/// One image attached to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A decoded Reddit link post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditPost {
    /// Base-36 id, e.g. `1abcde`
    pub id: String,
    /// Fullname, e.g. `t3_1abcde`
    pub name: String,
    pub title: String,
    pub author: String,
    pub subreddit: String,
    pub permalink: String,
    /// Link target (the image itself for direct image posts)
    pub url: String,
    #[serde(default)]
    pub domain: String,
    pub created_utc: DateTime<Utc>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub flair: Option<String>,
    #[serde(default)]
    pub post_hint: Option<String>,
    #[serde(default)]
    pub is_gallery: bool,
    #[serde(default)]
    pub images: Vec<PostImage>,
}

impl RedditPost {
    /// Whether any image could be extracted
    pub fn is_image_post(&self) -> bool {
        !self.images.is_empty()
    }

    /// First image, used as the gallery thumbnail
    pub fn cover_image(&self) -> Option<&PostImage> {
        self.images.first()
    }

    /// Absolute link to the Reddit comments page
    pub fn permalink_url(&self) -> String {
        format!("https://www.reddit.com{}", self.permalink)
    }
}

/// Item decoder for `t3` listing children
#[derive(Debug, Clone, Copy, Default)]
pub struct RedditPostDecoder;

impl RedditPostDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ItemDecoder for RedditPostDecoder {
    type Item = RedditPost;

    fn decode(&self, raw: &Value) -> Result<RedditPost, DecodeError> {
        let thing = RawThing::deserialize(raw).map_err(|e| DecodeError::new("$", e.to_string()))?;
        if thing.kind != LINK_KIND {
            return Err(DecodeError::new(
                "kind",
                format!("expected \"{LINK_KIND}\", found \"{}\"", thing.kind),
            ));
        }

        let post =
            RawPost::deserialize(&thing.data).map_err(|e| DecodeError::new("data", e.to_string()))?;
        post.into_post()
    }
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Deserialize)]
struct RawThing {
    kind: String,
    data: Value,
}

#[derive(Deserialize)]
struct RawPost {
    id: String,
    name: String,
    title: String,
    author: String,
    subreddit: String,
    permalink: String,
    url: String,
    created_utc: f64,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    num_comments: Option<u64>,
    #[serde(default)]
    over_18: Option<bool>,
    #[serde(default)]
    link_flair_text: Option<String>,
    #[serde(default)]
    post_hint: Option<String>,
    #[serde(default)]
    is_gallery: Option<bool>,
    #[serde(default)]
    preview: Option<RawPreview>,
    #[serde(default)]
    gallery_data: Option<RawGalleryData>,
    #[serde(default)]
    media_metadata: Option<HashMap<String, Option<RawMediaMetadata>>>,
}

#[derive(Deserialize)]
struct RawPreview {
    #[serde(default)]
    images: Vec<RawPreviewImage>,
}

#[derive(Deserialize)]
struct RawPreviewImage {
    source: RawImageSource,
}

#[derive(Deserialize)]
struct RawImageSource {
    url: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

#[derive(Deserialize)]
struct RawGalleryData {
    #[serde(default)]
    items: Vec<RawGalleryItem>,
}

#[derive(Deserialize)]
struct RawGalleryItem {
    media_id: String,
}

#[derive(Deserialize)]
struct RawMediaMetadata {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    s: Option<RawMediaSource>,
}

#[derive(Deserialize)]
struct RawMediaSource {
    #[serde(default)]
    u: Option<String>,
    #[serde(default)]
    gif: Option<String>,
    #[serde(default)]
    x: Option<u32>,
    #[serde(default)]
    y: Option<u32>,
}

impl RawPost {
    fn into_post(self) -> Result<RedditPost, DecodeError> {
        let created_utc = timestamp(self.created_utc)
            .ok_or_else(|| DecodeError::invalid("data.created_utc", "a valid epoch timestamp"))?;
        let images = self.images();
        let is_gallery = self.is_gallery.unwrap_or(false);

        Ok(RedditPost {
            id: self.id,
            name: self.name,
            title: self.title,
            author: self.author,
            subreddit: self.subreddit,
            permalink: self.permalink,
            url: unescape(&self.url),
            domain: self.domain.unwrap_or_default(),
            created_utc,
            score: self.score.unwrap_or_default(),
            num_comments: self.num_comments.unwrap_or_default(),
            over_18: self.over_18.unwrap_or(false),
            flair: self.link_flair_text.none_if_empty(),
            post_hint: self.post_hint,
            is_gallery,
            images,
        })
    }

    fn images(&self) -> Vec<PostImage> {
        let gallery = self.gallery_images();
        if !gallery.is_empty() {
            return gallery;
        }

        let preview = self
            .preview
            .as_ref()
            .and_then(|p| p.images.first())
            .map(|img| &img.source);

        if is_image_url(&self.url) {
            return vec![PostImage {
                url: unescape(&self.url),
                width: preview.and_then(|s| s.width),
                height: preview.and_then(|s| s.height),
            }];
        }

        match (self.post_hint.as_deref(), preview) {
            (Some("image"), Some(source)) => vec![PostImage {
                url: unescape(&source.url),
                width: source.width,
                height: source.height,
            }],
            _ => Vec::new(),
        }
    }

    fn gallery_images(&self) -> Vec<PostImage> {
        let (Some(gallery), Some(metadata)) = (&self.gallery_data, &self.media_metadata) else {
            return Vec::new();
        };

        gallery
            .items
            .iter()
            .filter_map(|item| metadata.get(&item.media_id)?.as_ref())
            .filter(|meta| meta.status.as_deref().map_or(true, |s| s == "valid"))
            .filter_map(|meta| {
                let source = meta.s.as_ref()?;
                let url = source.u.as_ref().or(source.gif.as_ref())?;
                Some(PostImage {
                    url: unescape(url),
                    width: source.x,
                    height: source.y,
                })
            })
            .collect()
    }
}

/// Whether a URL's path ends in a known image extension
pub fn is_image_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(parsed) => IMAGE_PATH_REGEX
            .as_ref()
            .is_some_and(|re| re.is_match(parsed.path())),
        Err(_) => false,
    }
}

/// Reddit HTML-escapes URLs unless `raw_json=1` was requested
fn unescape(url: &str) -> String {
    url.replace("&amp;", "&")
}

/// Epoch seconds to a UTC time, at millisecond precision
fn timestamp(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}
