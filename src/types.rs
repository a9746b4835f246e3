//! Common types used throughout reddit-gallery
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// Search Sort
// ============================================================================

/// Sort order for the subreddit search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    /// Newest first (the only order that makes incremental polling stop early)
    #[default]
    New,
    Relevance,
    Hot,
    Top,
    Comments,
}

impl SearchSort {
    /// Value sent in the `sort` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Relevance => "relevance",
            Self::Hot => "hot",
            Self::Top => "top",
            Self::Comments => "comments",
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.trim().is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_sort_default() {
        assert_eq!(SearchSort::default(), SearchSort::New);
        assert_eq!(SearchSort::default().as_str(), "new");
    }

    #[test]
    fn test_search_sort_serde() {
        let sort: SearchSort = serde_json::from_str("\"top\"").unwrap();
        assert_eq!(sort, SearchSort::Top);

        let json = serde_json::to_string(&SearchSort::Relevance).unwrap();
        assert_eq!(json, "\"relevance\"");
    }

    #[test]
    fn test_backoff_type_serde() {
        let backoff: BackoffType = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(backoff, BackoffType::Linear);
        assert_eq!(BackoffType::default(), BackoffType::Exponential);
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("OC".to_string()).none_if_empty(),
            Some("OC".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(Some("  ".to_string()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!("OC".to_string().none_if_empty(), Some("OC".to_string()));
        assert_eq!(String::new().none_if_empty(), None);
    }
}
