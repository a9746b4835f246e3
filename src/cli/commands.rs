//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Subreddit image gallery mirror
#[derive(Parser, Debug)]
#[command(name = "reddit-gallery")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Mirror configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subreddit to mirror (overrides the config file)
    #[arg(short = 'r', long, global = true)]
    pub subreddit: Option<String>,

    /// Gallery store file (JSON, overrides the config file)
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch new image posts once
    Poll {
        /// Walk the whole listing instead of stopping at known posts
        #[arg(long)]
        backfill: bool,
    },

    /// Poll on an interval until Ctrl-C
    Watch {
        /// Seconds between polls (overrides the config file)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Walk the whole listing on every poll
        #[arg(long)]
        backfill: bool,
    },

    /// Browse the gallery
    List {
        /// Case-insensitive text search over title, author, flair and tags
        #[arg(long)]
        search: Option<String>,

        /// Only posts with this flair
        #[arg(long)]
        flair: Option<String>,

        /// Only posts by this author
        #[arg(long)]
        author: Option<String>,

        /// Only posts with this tag
        #[arg(long)]
        tag: Option<String>,

        /// Include NSFW posts
        #[arg(long)]
        nsfw: bool,

        /// Include hidden posts
        #[arg(long)]
        hidden: bool,

        /// Skip this many posts
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Show at most this many posts
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one post
    Show {
        /// Reddit post id
        id: String,
    },

    /// Edit a post's gallery metadata
    Edit {
        /// Reddit post id
        id: String,

        /// Replace the displayed title
        #[arg(long, conflicts_with = "clear_title")]
        title: Option<String>,

        /// Go back to the Reddit title
        #[arg(long)]
        clear_title: bool,

        /// Add a tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Remove all tags (applied before --tag)
        #[arg(long)]
        clear_tags: bool,

        /// Hide the post from the gallery
        #[arg(long, conflicts_with = "unhide")]
        hide: bool,

        /// Show a hidden post again
        #[arg(long)]
        unhide: bool,
    },

    /// Remove a post from the gallery
    Remove {
        /// Reddit post id
        id: String,
    },

    /// Validate the configuration and show the listing it polls
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
