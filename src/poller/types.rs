//! Poller types
//!
//! Poll modes and the summary reported after each poll.

use crate::decode::RedditPost;
use serde::Serialize;
use std::collections::HashSet;

/// How far back a poll walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollMode {
    /// Stop at the first page that contains an already mirrored post
    #[default]
    Incremental,
    /// Walk until the API runs out of pages
    Backfill,
}

impl PollMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Backfill => "backfill",
        }
    }
}

/// Statistics from one poll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub mode: PollMode,
    /// Listing requests that got a response
    pub requests: u32,
    /// Posts decoded across all pages
    pub items_seen: usize,
    /// Image posts collected this poll
    pub image_posts: usize,
    /// Image posts that were not in the store before
    pub new_posts: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Fold payload for a poll
#[derive(Debug, Default)]
pub(crate) struct Harvest {
    pub posts: Vec<RedditPost>,
    pub collected: HashSet<String>,
    pub items_seen: usize,
}

impl Harvest {
    /// Keep an image post unless this poll already has it
    pub fn collect(&mut self, post: RedditPost) {
        if post.is_image_post() && self.collected.insert(post.id.clone()) {
            self.posts.push(post);
        }
    }
}
