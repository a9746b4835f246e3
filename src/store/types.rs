//! Gallery store types
//!
//! These types are serialized to JSON and persisted between runs.

use crate::decode::RedditPost;
use crate::types::OptionStringExt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current on-disk document version
pub const GALLERY_VERSION: u32 = 1;

/// The whole mirrored collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gallery {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Posts keyed by Reddit id
    #[serde(default)]
    pub posts: BTreeMap<String, StoredPost>,

    /// When the last successful poll finished
    #[serde(default)]
    pub last_poll: Option<DateTime<Utc>>,
}

fn default_version() -> u32 {
    GALLERY_VERSION
}

impl Default for Gallery {
    fn default() -> Self {
        Self {
            version: GALLERY_VERSION,
            posts: BTreeMap::new(),
            last_poll: None,
        }
    }
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A mirrored post plus what the admin has layered on top of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPost {
    pub post: RedditPost,

    #[serde(default)]
    pub metadata: PostMetadata,

    /// When the poller first saw the post
    pub first_seen: DateTime<Utc>,
}

impl StoredPost {
    pub fn new(post: RedditPost, first_seen: DateTime<Utc>) -> Self {
        Self {
            post,
            metadata: PostMetadata::default(),
            first_seen,
        }
    }

    /// Title shown in the gallery: the override if set, else Reddit's
    pub fn display_title(&self) -> &str {
        self.metadata
            .title_override
            .as_deref()
            .unwrap_or(&self.post.title)
    }

    pub fn id(&self) -> &str {
        &self.post.id
    }
}

/// Admin-editable metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_override: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

/// A partial update to [`PostMetadata`]
///
/// Clears are applied before sets, so `clear_tags` plus `add_tags` replaces
/// the tag list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataPatch {
    pub title: Option<String>,
    pub clear_title: bool,
    pub add_tags: Vec<String>,
    pub clear_tags: bool,
    pub hidden: Option<bool>,
}

impl MetadataPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn clear_title(mut self) -> Self {
        self.clear_title = true;
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn clear_tags(mut self) -> Self {
        self.clear_tags = true;
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Nothing to change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && !self.clear_title
            && self.add_tags.is_empty()
            && !self.clear_tags
            && self.hidden.is_none()
    }

    /// Apply to `metadata`, stamping `edited_at` with `now`
    pub fn apply(&self, metadata: &mut PostMetadata, now: DateTime<Utc>) {
        if self.clear_title {
            metadata.title_override = None;
        }
        if let Some(title) = self.title.clone().none_if_empty() {
            metadata.title_override = Some(title.trim().to_string());
        }

        if self.clear_tags {
            metadata.tags.clear();
        }
        for tag in &self.add_tags {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !metadata.tags.contains(&tag) {
                metadata.tags.push(tag);
            }
        }

        if let Some(hidden) = self.hidden {
            metadata.hidden = hidden;
        }

        metadata.edited_at = Some(now);
    }
}

/// Filter and window over the gallery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    /// Case-insensitive substring over title, author, flair and tags
    pub search: Option<String>,
    pub flair: Option<String>,
    pub author: Option<String>,
    pub tag: Option<String>,
    pub include_hidden: bool,
    pub include_nsfw: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl PostQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    #[must_use]
    pub fn flair(mut self, flair: impl Into<String>) -> Self {
        self.flair = Some(flair.into());
        self
    }

    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    #[must_use]
    pub fn include_nsfw(mut self, include: bool) -> Self {
        self.include_nsfw = include;
        self
    }

    #[must_use]
    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Whether a single post passes the filters (window not applied)
    pub fn matches(&self, stored: &StoredPost) -> bool {
        let post = &stored.post;
        let metadata = &stored.metadata;

        if metadata.hidden && !self.include_hidden {
            return false;
        }
        if post.over_18 && !self.include_nsfw {
            return false;
        }

        if let Some(author) = &self.author {
            if !post.author.eq_ignore_ascii_case(author) {
                return false;
            }
        }

        if let Some(flair) = &self.flair {
            let matched = post
                .flair
                .as_deref()
                .is_some_and(|f| f.to_lowercase() == flair.to_lowercase());
            if !matched {
                return false;
            }
        }

        if let Some(tag) = &self.tag {
            let tag = tag.trim().to_lowercase();
            if !metadata.tags.iter().any(|t| *t == tag) {
                return false;
            }
        }

        if let Some(search) = self.search.clone().none_if_empty() {
            let needle = search.trim().to_lowercase();
            let haystacks = [
                Some(stored.display_title()),
                Some(post.author.as_str()),
                post.flair.as_deref(),
            ];
            let hit = haystacks
                .into_iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&needle))
                || metadata.tags.iter().any(|t| t.contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }
}
