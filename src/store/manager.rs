//! Post store implementation
//!
//! Provides file-based gallery persistence with atomic writes.

use super::types::{Gallery, MetadataPatch, PostQuery, StoredPost};
use crate::decode::RedditPost;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Store for the mirrored gallery
#[derive(Debug)]
pub struct PostStore {
    /// Path to the gallery file
    path: PathBuf,
    /// Current gallery (cached)
    gallery: Arc<RwLock<Gallery>>,
    /// Whether to save after every mutation
    auto_save: bool,
}

impl PostStore {
    /// Create an empty store that will write to `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            gallery: Arc::new(RwLock::new(Gallery::new())),
            auto_save: true,
        }
    }

    /// Create a store with auto-save disabled
    pub fn without_auto_save(path: impl AsRef<Path>) -> Self {
        Self {
            auto_save: false,
            ..Self::new(path)
        }
    }

    /// Create an in-memory store (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            gallery: Arc::new(RwLock::new(Gallery::new())),
            auto_save: false,
        }
    }

    /// Open the store at `path`, loading the gallery if the file exists
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let gallery = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::store(format!("Failed to read gallery file: {e}")))?;
            parse_gallery(&contents)?
        } else {
            Gallery::new()
        };

        Ok(Self {
            path,
            gallery: Arc::new(RwLock::new(gallery)),
            auto_save: true,
        })
    }

    /// Reload the gallery from disk
    pub async fn load(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::store(format!("Failed to read gallery file: {e}")))?;
        let loaded = parse_gallery(&contents)?;

        let mut gallery = self.gallery.write().await;
        *gallery = loaded;

        Ok(())
    }

    /// Write the gallery to disk
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let gallery = self.gallery.read().await;
            serde_json::to_string_pretty(&*gallery)
                .map_err(|e| Error::store(format!("Failed to serialize gallery: {e}")))?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::store(format!("Failed to create gallery directory: {e}")))?;
        }

        // Write to temp file first, then rename
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::store(format!("Failed to write gallery file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::store(format!("Failed to rename gallery file: {e}")))?;

        debug!(path = %self.path.display(), "Saved gallery");
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    /// Whether a post id is already mirrored
    pub async fn contains(&self, id: &str) -> bool {
        self.gallery.read().await.posts.contains_key(id)
    }

    /// Get a copy of one post
    pub async fn get(&self, id: &str) -> Option<StoredPost> {
        self.gallery.read().await.posts.get(id).cloned()
    }

    /// Number of mirrored posts, hidden ones included
    pub async fn len(&self) -> usize {
        self.gallery.read().await.posts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ids of every mirrored post
    pub async fn ids(&self) -> Vec<String> {
        self.gallery.read().await.posts.keys().cloned().collect()
    }

    /// Insert new posts and refresh the Reddit fields of known ones
    ///
    /// Metadata of existing posts is left alone. Returns how many posts were new.
    pub async fn upsert_posts(
        &self,
        posts: impl IntoIterator<Item = RedditPost>,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let mut inserted = 0;
        {
            let mut gallery = self.gallery.write().await;
            for post in posts {
                match gallery.posts.get_mut(&post.id) {
                    Some(existing) => existing.post = post,
                    None => {
                        gallery
                            .posts
                            .insert(post.id.clone(), StoredPost::new(post, now));
                        inserted += 1;
                    }
                }
            }
        }

        self.persist().await?;
        Ok(inserted)
    }

    /// Apply an admin edit to one post and return the updated post
    pub async fn update_metadata(
        &self,
        id: &str,
        patch: &MetadataPatch,
        now: DateTime<Utc>,
    ) -> Result<StoredPost> {
        let updated = {
            let mut gallery = self.gallery.write().await;
            let stored = gallery
                .posts
                .get_mut(id)
                .ok_or_else(|| Error::post_not_found(id))?;
            patch.apply(&mut stored.metadata, now);
            stored.clone()
        };

        self.persist().await?;
        Ok(updated)
    }

    /// Remove one post and return it
    pub async fn remove(&self, id: &str) -> Result<StoredPost> {
        let removed = {
            let mut gallery = self.gallery.write().await;
            gallery
                .posts
                .remove(id)
                .ok_or_else(|| Error::post_not_found(id))?
        };

        self.persist().await?;
        Ok(removed)
    }

    /// Posts matching `query`, newest first, windowed by offset/limit
    pub async fn query(&self, query: &PostQuery) -> Vec<StoredPost> {
        let gallery = self.gallery.read().await;
        let mut matched: Vec<&StoredPost> = gallery
            .posts
            .values()
            .filter(|stored| query.matches(stored))
            .collect();

        matched.sort_by(|a, b| {
            b.post
                .created_utc
                .cmp(&a.post.created_utc)
                .then_with(|| a.post.id.cmp(&b.post.id))
        });

        matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// When the last successful poll finished
    pub async fn last_poll(&self) -> Option<DateTime<Utc>> {
        self.gallery.read().await.last_poll
    }

    /// Record a finished poll
    pub async fn set_last_poll(&self, at: DateTime<Utc>) -> Result<()> {
        {
            let mut gallery = self.gallery.write().await;
            gallery.last_poll = Some(at);
        }

        self.persist().await
    }

    /// Get the gallery file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for PostStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            gallery: Arc::clone(&self.gallery),
            auto_save: self.auto_save,
        }
    }
}

fn parse_gallery(contents: &str) -> Result<Gallery> {
    serde_json::from_str(contents)
        .map_err(|e| Error::store(format!("Failed to parse gallery file: {e}")))
}
