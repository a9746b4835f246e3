//! Listing reduction
//!
//! Walks a listing page by page, folding each decoded page into a caller
//! accumulator. Pages are strictly sequential: the next request needs the
//! `after` cursor of the previous page and the running `dist` total.
//!
//! Only transport failures escape as errors. A non-200 status or an
//! undecodable page ends the walk and the accumulator so far is returned.

use super::fetcher::ListingSource;
use super::types::{PageResponse, ReducerAccumulator, ReducerLimits, ReducerReturn};
use crate::decode::{decode_listing, ItemDecoder, Listing};
use crate::error::Result;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Fetch and decode a single page
///
/// `Ok(None)` means the page was refused or could not be decoded.
pub async fn reduce_listing<S, D>(
    source: &S,
    decoder: &D,
    after: Option<&str>,
    count: u64,
) -> Result<Option<Listing<D::Item>>>
where
    S: ListingSource + ?Sized,
    D: ItemDecoder + ?Sized,
{
    let response = source.fetch_page(after, count).await?;
    Ok(decode_page(&response, decoder))
}

/// Fold every page of a listing until the fold or the API says stop
///
/// The fold receives each decoded page together with the state before that
/// page's `dist` is counted, and returns the new payload plus whether to go on.
/// A page without an `after` cursor always ends the walk.
pub async fn reduce_listings<S, D, B, F>(
    source: &S,
    decoder: &D,
    initial: B,
    limits: &ReducerLimits,
    mut fold: F,
) -> Result<ReducerAccumulator<B>>
where
    S: ListingSource + ?Sized,
    D: ItemDecoder + ?Sized,
    F: FnMut(Listing<D::Item>, ReducerAccumulator<B>) -> ReducerReturn<B>,
{
    let mut state = ReducerAccumulator::empty(initial);
    let mut cursor: Option<String> = None;
    let mut seen_cursors: HashSet<String> = HashSet::new();

    loop {
        if let Some(max) = limits.max_requests {
            if state.requests_count >= max {
                warn!(
                    max_requests = max,
                    "Request limit reached, stopping pagination"
                );
                break;
            }
        }

        let response = source
            .fetch_page(cursor.as_deref(), state.dist_count)
            .await?;
        state = state.with_request();

        let Some(page) = decode_page(&response, decoder) else {
            break;
        };

        let dist = page.dist;
        let after = page.after.clone();
        let counters = state.counters();
        let step = fold(page, state);
        state = counters.with_page(dist, step.accumulator);

        debug!(
            requests = state.requests_count,
            dist_count = state.dist_count,
            should_continue = step.should_continue,
            has_after = after.is_some(),
            "Folded listing page"
        );

        if !step.should_continue {
            break;
        }

        let Some(next) = after else {
            break;
        };

        if limits.detect_repeated_cursor && !seen_cursors.insert(next.clone()) {
            warn!(cursor = %next, "Listing returned a cursor it already returned, stopping pagination");
            break;
        }

        cursor = Some(next);
    }

    Ok(state)
}

/// Turn a raw response into a page, or `None` when there is nothing to fold
fn decode_page<D>(response: &PageResponse, decoder: &D) -> Option<Listing<D::Item>>
where
    D: ItemDecoder + ?Sized,
{
    if !response.is_ok() {
        warn!(
            status = response.status,
            "Listing page unavailable, treating as end of pages"
        );
        return None;
    }

    let raw: Value = match serde_json::from_str(&response.body) {
        Ok(raw) => raw,
        Err(e) => {
            error!(error = %e, url = %response.request.url, "Listing response is not valid JSON");
            return None;
        }
    };

    match decode_listing(&raw, decoder) {
        Ok(page) => Some(page),
        Err(e) => {
            error!(error = %e, url = %response.request.url, "Could not parse listing page");
            None
        }
    }
}
