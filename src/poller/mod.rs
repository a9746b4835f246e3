//! Poller module
//!
//! The mirror job: walks the subreddit search listing through the reducer and
//! writes image posts into the gallery store.
//!
//! # Overview
//!
//! The poller module provides:
//! - `Poller` - One-shot polls and the interval watch loop
//! - `PollMode` - Incremental (stop at known posts) or full backfill
//! - `PollSummary` - What a poll fetched and stored

mod types;

pub use types::{PollMode, PollSummary};

use crate::decode::RedditPostDecoder;
use crate::error::Result;
use crate::pagination::{reduce_listings, ListingSource, ReducerLimits, ReducerReturn};
use crate::store::PostStore;
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use types::Harvest;

/// Polls a listing source into a post store
pub struct Poller<S> {
    /// Where listing pages come from
    source: S,
    /// Where image posts go
    store: PostStore,
    /// Guards for each reduction
    limits: ReducerLimits,
    decoder: RedditPostDecoder,
}

impl<S: ListingSource> Poller<S> {
    /// Create a new poller
    pub fn new(source: S, store: PostStore) -> Self {
        Self {
            source,
            store,
            limits: ReducerLimits::default(),
            decoder: RedditPostDecoder::new(),
        }
    }

    /// Set reducer limits
    #[must_use]
    pub fn with_limits(mut self, limits: ReducerLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Get the store
    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Run one poll
    ///
    /// A transport failure aborts the poll before the store is touched.
    pub async fn poll_once(&self, mode: PollMode) -> Result<PollSummary> {
        let start = Instant::now();
        let known: HashSet<String> = self.store.ids().await.into_iter().collect();

        info!(mode = mode.as_str(), known = known.len(), "Starting poll");

        let result = reduce_listings(
            &self.source,
            &self.decoder,
            Harvest::default(),
            &self.limits,
            |page, state| {
                let mut harvest = state.accumulator;
                let mut reached_known = false;

                for post in page.children {
                    harvest.items_seen += 1;
                    if known.contains(&post.id) {
                        reached_known = true;
                        if mode == PollMode::Incremental {
                            continue;
                        }
                    }
                    harvest.collect(post);
                }

                if mode == PollMode::Incremental && reached_known {
                    ReducerReturn::stop(harvest)
                } else {
                    ReducerReturn::next(harvest)
                }
            },
        )
        .await?;

        let requests = result.requests_count;
        let harvest = result.into_inner();
        let image_posts = harvest.posts.len();

        let now = Utc::now();
        let new_posts = self.store.upsert_posts(harvest.posts, now).await?;
        self.store.set_last_poll(now).await?;

        let summary = PollSummary {
            mode,
            requests,
            items_seen: harvest.items_seen,
            image_posts,
            new_posts,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            mode = mode.as_str(),
            requests = summary.requests,
            items_seen = summary.items_seen,
            image_posts = summary.image_posts,
            new_posts = summary.new_posts,
            duration_ms = summary.duration_ms,
            "Poll complete"
        );

        Ok(summary)
    }

    /// Poll every `interval` until Ctrl-C
    pub async fn watch(&self, interval: Duration, mode: PollMode) -> Result<usize> {
        self.watch_until(interval, mode, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Could not listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Poll every `interval` until `shutdown` resolves, returning the number of polls run
    ///
    /// A failed poll is logged and the loop carries on.
    pub async fn watch_until<F>(
        &self,
        interval: Duration,
        mode: PollMode,
        shutdown: F,
    ) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval_secs = interval.as_secs(), mode = mode.as_str(), "Watching for new posts");

        let mut polls = 0;
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!(polls, "Stopping watch");
                    break;
                }
                _ = ticker.tick() => {
                    polls += 1;
                    match self.poll_once(mode).await {
                        Ok(_) => {}
                        Err(e) if e.is_retryable() => {
                            warn!(error = %e, "Poll failed, retrying next interval");
                        }
                        Err(e) => {
                            error!(error = %e, "Poll failed");
                        }
                    }
                }
            }
        }

        Ok(polls)
    }
}
