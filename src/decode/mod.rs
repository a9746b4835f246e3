//! Response decoder module
//!
//! Decodes Reddit listing pages and the link posts inside them.
//!
//! # Overview
//!
//! - [`decode_listing`] validates the page envelope and decodes each child
//!   with an [`ItemDecoder`], dropping (and logging) children that fail.
//! - [`RedditPostDecoder`] is the item decoder for `t3` link children.

mod listing;
mod post;
mod types;

pub use listing::{decode_listing, decode_listing_detailed};
pub use post::{is_image_url, PostImage, RedditPost, RedditPostDecoder};
pub use types::{
    decode_fn, DecodeError, DecodedListing, FnDecoder, ItemDecoder, Listing, SerdeDecoder,
};

#[cfg(test)]
mod tests;
