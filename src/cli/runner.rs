//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::MirrorConfig;
use crate::error::{Error, Result, ResultExt};
use crate::pagination::HttpListingSource;
use crate::poller::{PollMode, Poller};
use crate::store::{MetadataPatch, PostQuery, PostStore, StoredPost};
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Poll { backfill } => self.poll(mode(*backfill)).await,
            Commands::Watch { interval, backfill } => self.watch(*interval, mode(*backfill)).await,
            Commands::List {
                search,
                flair,
                author,
                tag,
                nsfw,
                hidden,
                offset,
                limit,
            } => {
                let query = PostQuery {
                    search: search.clone(),
                    flair: flair.clone(),
                    author: author.clone(),
                    tag: tag.clone(),
                    include_hidden: *hidden,
                    include_nsfw: *nsfw,
                    offset: *offset,
                    limit: *limit,
                };
                self.list(&query).await
            }
            Commands::Show { id } => self.show(id).await,
            Commands::Edit {
                id,
                title,
                clear_title,
                tags,
                clear_tags,
                hide,
                unhide,
            } => {
                let patch = MetadataPatch {
                    title: title.clone(),
                    clear_title: *clear_title,
                    add_tags: tags.clone(),
                    clear_tags: *clear_tags,
                    hidden: match (*hide, *unhide) {
                        (true, _) => Some(true),
                        (_, true) => Some(false),
                        _ => None,
                    },
                };
                self.edit(id, &patch).await
            }
            Commands::Remove { id } => self.remove(id).await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load the config file (if any) and apply command-line overrides
    fn load_config(&self) -> Result<MirrorConfig> {
        let config = match &self.cli.config {
            Some(path) => MirrorConfig::from_file(path)?,
            None => MirrorConfig::default(),
        };
        Ok(config.with_overrides(self.cli.subreddit.as_deref(), self.cli.store.as_deref()))
    }

    /// Config for commands that talk to Reddit
    fn load_poll_config(&self) -> Result<MirrorConfig> {
        let config = self.load_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Open the gallery store
    fn open_store(&self, config: &MirrorConfig) -> Result<PostStore> {
        PostStore::from_file(&config.store.path)
            .with_context(|| format!("Cannot open gallery '{}'", config.store.path.display()))
    }

    fn build_poller(&self, config: &MirrorConfig) -> Result<Poller<HttpListingSource>> {
        let store = self.open_store(config)?;
        let source = config.listing_source()?;
        Ok(Poller::new(source, store).with_limits(config.reducer_limits()))
    }

    /// Poll once
    async fn poll(&self, mode: PollMode) -> Result<()> {
        let config = self.load_poll_config()?;
        let poller = self.build_poller(&config)?;

        let summary = poller.poll_once(mode).await?;

        self.output_message(&json!({
            "type": "POLL",
            "subreddit": config.subreddit_name(),
            "summary": summary,
            "store": poller.store().path(),
            "total_posts": poller.store().len().await,
        }));

        Ok(())
    }

    /// Poll on an interval until Ctrl-C
    async fn watch(&self, interval: Option<u64>, mode: PollMode) -> Result<()> {
        let mut config = self.load_poll_config()?;
        if let Some(secs) = interval {
            if secs == 0 {
                return Err(Error::invalid_value("interval", "must be positive"));
            }
            config.poll.interval_secs = secs;
        }
        let poller = self.build_poller(&config)?;

        info!(
            subreddit = config.subreddit_name(),
            store = %config.store.path.display(),
            "Starting watch, press Ctrl-C to stop"
        );

        let polls = poller
            .watch(Duration::from_secs(config.poll.interval_secs), mode)
            .await?;

        self.output_message(&json!({
            "type": "WATCH",
            "polls": polls,
            "total_posts": poller.store().len().await,
            "last_poll": poller.store().last_poll().await,
        }));

        Ok(())
    }

    /// List gallery posts
    async fn list(&self, query: &PostQuery) -> Result<()> {
        let config = self.load_config()?;
        let store = self.open_store(&config)?;

        let posts = store.query(query).await;
        let posts: Vec<Value> = posts.iter().map(post_summary).collect();

        self.output_message(&json!({
            "type": "POSTS",
            "count": posts.len(),
            "total": store.len().await,
            "posts": posts,
        }));

        Ok(())
    }

    /// Show one post in full
    async fn show(&self, id: &str) -> Result<()> {
        let config = self.load_config()?;
        let store = self.open_store(&config)?;

        let stored = store
            .get(id)
            .await
            .ok_or_else(|| Error::post_not_found(id))?;

        self.output_message(&json!({
            "type": "POST",
            "post": stored,
        }));

        Ok(())
    }

    /// Edit a post's metadata
    async fn edit(&self, id: &str, patch: &MetadataPatch) -> Result<()> {
        if patch.is_empty() {
            return Err(Error::config(
                "Nothing to edit (use --title, --clear-title, --tag, --clear-tags, --hide or --unhide)",
            ));
        }

        let config = self.load_config()?;
        let store = self.open_store(&config)?;

        let updated = store.update_metadata(id, patch, Utc::now()).await?;
        info!(id, "Updated post metadata");

        self.output_message(&json!({
            "type": "POST",
            "post": updated,
        }));

        Ok(())
    }

    /// Remove a post
    async fn remove(&self, id: &str) -> Result<()> {
        let config = self.load_config()?;
        let store = self.open_store(&config)?;

        let removed = store.remove(id).await?;
        info!(id, "Removed post from gallery");

        self.output_message(&json!({
            "type": "REMOVED",
            "id": removed.id(),
            "total": store.len().await,
        }));

        Ok(())
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_poll_config()?;

        self.output_message(&json!({
            "type": "CONFIG",
            "subreddit": config.subreddit_name(),
            "endpoint": format!("{}{}", config.base_url.trim_end_matches('/'), config.endpoint_path()),
            "params": config.listing_params(),
            "store": config.store.path,
            "interval_secs": config.poll.interval_secs,
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn mode(backfill: bool) -> PollMode {
    if backfill {
        PollMode::Backfill
    } else {
        PollMode::Incremental
    }
}

/// Gallery card view of a post
fn post_summary(stored: &StoredPost) -> Value {
    let post = &stored.post;
    json!({
        "id": post.id,
        "title": stored.display_title(),
        "author": post.author,
        "flair": post.flair,
        "created_utc": post.created_utc,
        "permalink": post.permalink_url(),
        "cover": post.cover_image().map(|image| image.url.as_str()),
        "images": post.images.len(),
        "tags": stored.metadata.tags,
        "hidden": stored.metadata.hidden,
        "nsfw": post.over_18,
    })
}
