//! Pagination types
//!
//! Defines the fold state threaded through a listing reduction, the raw page
//! response produced by a fetch, and the knobs that shape page requests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fold state carried from page to page
///
/// Never mutated in place: every step produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducerAccumulator<B> {
    /// Fetches that produced a response, whatever its status
    pub requests_count: u32,
    /// Sum of `dist` over the pages folded so far
    pub dist_count: u64,
    /// Caller payload
    pub accumulator: B,
}

impl<B> ReducerAccumulator<B> {
    /// Fresh state: no requests, no items
    pub fn empty(initial: B) -> Self {
        Self {
            requests_count: 0,
            dist_count: 0,
            accumulator: initial,
        }
    }

    /// Count one more response
    #[must_use]
    pub fn with_request(self) -> Self {
        Self {
            requests_count: self.requests_count + 1,
            ..self
        }
    }

    /// The counters alone, without the payload
    pub fn counters(&self) -> ReducerAccumulator<()> {
        ReducerAccumulator {
            requests_count: self.requests_count,
            dist_count: self.dist_count,
            accumulator: (),
        }
    }

    /// Count a folded page and take the payload the fold returned
    #[must_use]
    pub fn with_page<C>(self, dist: u64, accumulator: C) -> ReducerAccumulator<C> {
        ReducerAccumulator {
            requests_count: self.requests_count,
            dist_count: self.dist_count + dist,
            accumulator,
        }
    }

    /// Drop the counters and keep the payload
    pub fn into_inner(self) -> B {
        self.accumulator
    }
}

/// What a fold returns for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducerReturn<B> {
    /// Whether to fetch the next page (if the API has one)
    pub should_continue: bool,
    /// Payload after folding this page
    pub accumulator: B,
}

impl<B> ReducerReturn<B> {
    /// Keep paginating
    pub fn next(accumulator: B) -> Self {
        Self {
            should_continue: true,
            accumulator,
        }
    }

    /// Stop after this page
    pub fn stop(accumulator: B) -> Self {
        Self {
            should_continue: false,
            accumulator,
        }
    }
}

/// Safety limits for a reduction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducerLimits {
    /// Stop once this many responses have been received
    pub max_requests: Option<u32>,
    /// Stop when the API hands back a cursor it already returned
    pub detect_repeated_cursor: bool,
}

impl Default for ReducerLimits {
    fn default() -> Self {
        Self {
            max_requests: None,
            detect_repeated_cursor: true,
        }
    }
}

impl ReducerLimits {
    /// No cap, no repeat detection
    pub fn unbounded() -> Self {
        Self {
            max_requests: None,
            detect_repeated_cursor: false,
        }
    }

    /// Cap the number of requests
    #[must_use]
    pub fn with_max_requests(mut self, max: u32) -> Self {
        self.max_requests = Some(max);
        self
    }
}

/// Names of the query parameters the reducer controls
///
/// Reddit expects `after` plus a cumulative `count`; other listing APIs may
/// name the cursor differently or not want a count at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageParams {
    /// Query parameter carrying the cursor
    pub after_param: String,
    /// Query parameter carrying the running item count, if any
    pub count_param: Option<String>,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            after_param: "after".to_string(),
            count_param: Some("count".to_string()),
        }
    }
}

/// The request that produced a page, echoed back with the response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestEcho {
    pub method: String,
    pub url: String,
    pub query: BTreeMap<String, String>,
}

/// Raw response for one page, undecoded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub request: RequestEcho,
}

impl PageResponse {
    /// Response with just a status and a body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }

    /// Only a plain 200 carries a page
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}
