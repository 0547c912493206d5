//! HTTP access to the listing API.
//!
//! [`Transport`] is the seam the paginator talks to; [`ListingClient`] is the
//! reqwest-backed implementation.

use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::error::FetchError;
use crate::event::ListingResponse;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches one page of listing results.
pub trait Transport {
    /// Issue a single GET for `url`. No retries.
    fn fetch_page(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<ListingResponse, FetchError>>;
}

/// reqwest-backed [`Transport`] with a per-request timeout.
pub struct ListingClient {
    client: reqwest::Client,
}

impl ListingClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Transport)?;
        Ok(Self::with_client(client))
    }

    /// Wrap a preconfigured reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ListingClient {
    async fn fetch_page(&self, url: &Url) -> Result<ListingResponse, FetchError> {
        // URLs carry the access token, so errors are stripped of them.
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json().await.map_err(|e| {
            let e = e.without_url();
            if e.is_decode() {
                FetchError::Decode(Box::new(e))
            } else {
                FetchError::Transport(e)
            }
        })
    }
}
