//! Pagination module
//!
//! Walks Reddit's `after`-cursor listings.
//!
//! # Overview
//!
//! - [`ListingSource`] fetches one raw page; [`HttpListingSource`] is the
//!   HTTP implementation that injects the `after` cursor and running `count`.
//! - [`reduce_listing`] fetches and decodes one page.
//! - [`reduce_listings`] folds pages into an accumulator until the fold stops,
//!   the API runs out of cursors, or a [`ReducerLimits`] guard trips.

mod fetcher;
mod reducer;
mod types;

pub use fetcher::{HttpListingSource, ListingSource};
pub use reducer::{reduce_listing, reduce_listings};
pub use types::{
    PageParams, PageResponse, ReducerAccumulator, ReducerLimits, ReducerReturn, RequestEcho,
};
