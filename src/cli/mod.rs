//! CLI module
//!
//! Command-line interface for the gallery mirror.
//!
//! # Commands
//!
//! - `poll` - Fetch new image posts once
//! - `watch` - Poll on an interval until Ctrl-C
//! - `list` - Browse and search the gallery
//! - `show` - Show one post
//! - `edit` - Edit a post's title, tags and visibility
//! - `remove` - Remove a post
//! - `validate` - Check the configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
