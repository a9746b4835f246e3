//! Gallery store module
//!
//! Persists mirrored posts between runs and answers gallery queries.
//!
//! # Overview
//!
//! The store module provides:
//! - `Gallery` - The on-disk document: posts keyed by id plus the last poll time
//! - `PostStore` - File-backed (or in-memory) access with atomic writes
//! - `PostQuery` / `MetadataPatch` - Browsing filters and admin edits

mod manager;
mod types;

pub use manager::PostStore;
pub use types::{Gallery, MetadataPatch, PostMetadata, PostQuery, StoredPost, GALLERY_VERSION};

#[cfg(test)]
mod tests;
