//! Page fetching
//!
//! One call, one GET. The fetcher injects the cursor and running count into
//! the request and hands the raw response back; decoding happens elsewhere.

use super::types::{PageParams, PageResponse, RequestEcho};
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Something that can produce listing pages
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the page after `after` (first page when `None`)
    ///
    /// `count` is the number of items already seen. Returns `Err` only when
    /// no response was obtained at all.
    async fn fetch_page(&self, after: Option<&str>, count: u64) -> Result<PageResponse>;
}

/// Listing source that performs real HTTP requests
#[derive(Debug, Clone)]
pub struct HttpListingSource {
    client: HttpClient,
    url: String,
    base: RequestConfig,
    params: PageParams,
}

impl HttpListingSource {
    /// Create a source for `url` with the fixed request settings in `base`
    pub fn new(client: HttpClient, url: impl Into<String>, base: RequestConfig) -> Self {
        Self {
            client,
            url: url.into(),
            base,
            params: PageParams::default(),
        }
    }

    /// Override the cursor/count parameter names
    #[must_use]
    pub fn with_params(mut self, params: PageParams) -> Self {
        self.params = params;
        self
    }

    /// Build the request for one page.
    ///
    /// Transport failures are never retried here; they end the reduction.
    pub fn page_request(&self, after: Option<&str>, count: u64) -> RequestConfig {
        let mut request = self.base.clone().fail_fast();
        if let Some(after) = after {
            request = request.query(&self.params.after_param, after);
        }
        if let Some(count_param) = &self.params.count_param {
            request = request.query(count_param, count.to_string());
        }
        request
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    async fn fetch_page(&self, after: Option<&str>, count: u64) -> Result<PageResponse> {
        let request = self.page_request(after, count);
        let query: BTreeMap<String, String> = request
            .query
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let response = self.client.get_with_config(&self.url, request).await?;

        let status = response.status();
        let url = response.url().to_string();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        debug!(
            method = "GET",
            url = %url,
            params = ?query,
            status = status.as_u16(),
            "Listing request completed"
        );

        let page = PageResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            request: RequestEcho {
                method: "GET".to_string(),
                url,
                query,
            },
        };

        if !page.is_ok() {
            warn!(
                status = page.status,
                status_text = %page.status_text,
                headers = ?page.headers,
                body = %page.body,
                url = %page.request.url,
                "Listing request returned a non-200 response"
            );
        }

        Ok(page)
    }
}
