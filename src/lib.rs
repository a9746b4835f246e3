// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # reddit-gallery
//!
//! Mirrors the image posts of one subreddit into a local gallery that an
//! admin can curate and users can browse, filter and search.
//!
//! ## Features
//!
//! - **Listing reducer**: walks Reddit's `after`-cursor pagination and folds
//!   each decoded page into a caller accumulator, stopping when the fold says so
//! - **Tolerant decoding**: children that fail to decode are dropped and logged,
//!   the rest of the page survives
//! - **Image extraction**: direct links, preview sources and multi-image galleries
//! - **Gallery store**: JSON file with title overrides, tags and hidden posts
//! - **Polling**: incremental polls that stop at known posts, or full backfills
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reddit_gallery::{MirrorConfig, Poller, PollMode, PostStore, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = MirrorConfig::for_subreddit("earthporn");
//!     config.validate()?;
//!
//!     let store = PostStore::from_file(&config.store.path)?;
//!     let poller = Poller::new(config.listing_source()?, store)
//!         .with_limits(config.reducer_limits());
//!
//!     let summary = poller.poll_once(PollMode::Incremental).await?;
//!     println!("{} new posts", summary.new_posts);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     CLI / Poller                             │
//! │   poll · watch · list · show · edit · remove                 │
//! └──────────────────────────────────────────────────────────────┘
//!                │                                  │
//! ┌──────────────┴──────────────┐      ┌────────────┴───────────┐
//! │        Pagination           │      │         Store          │
//! │ reduce_listings → fetch →   │      │ Gallery JSON, queries, │
//! │ decode → fold → next cursor │      │ metadata edits         │
//! └──────────────┬──────────────┘      └────────────────────────┘
//! ┌──────────────┴──────────────┬─────────────────────────────────┐
//! │            HTTP             │            Decode               │
//! │ Retry · Rate limit · Backoff│ Listing envelope · t3 posts     │
//! └─────────────────────────────┴─────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Listing and post decoders
pub mod decode;

/// Listing pagination and reduction
pub mod pagination;

/// Gallery persistence and queries
pub mod store;

/// Polling job
pub mod poller;

/// Mirror configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::MirrorConfig;
pub use decode::{Listing, RedditPost, RedditPostDecoder};
pub use pagination::{reduce_listing, reduce_listings, ReducerAccumulator, ReducerReturn};
pub use poller::{PollMode, PollSummary, Poller};
pub use store::{PostQuery, PostStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
