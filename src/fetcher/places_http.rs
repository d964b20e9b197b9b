//! Places HTTP client helper module
//!
//! Provides the HTTP plumbing shared by all Places endpoints:
//! - GET with query parameters and JSON decoding
//! - GET returning the raw body as a byte stream (photos)
//! - Retry with exponential backoff on transport errors, HTTP 429 and 5xx
//!
//! API-level failures (a JSON body whose `status` is not `OK`) arrive with
//! HTTP 200 and are passed through untouched; they are never retried here.

use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::downloader::config::{calculate_backoff, MAX_RETRIES};
use crate::fetcher::{FetcherError, FetcherResult, PhotoStream};

/// HTTP client for the Places web service
#[derive(Clone)]
pub struct PlacesHttpClient {
    client: Arc<Client>,
    base_url: String,
    max_retries: u32,
}

impl PlacesHttpClient {
    /// Create new HTTP client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `base_url` - Base URL for API endpoints, without trailing slash
    pub fn new(client: Arc<Client>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: MAX_RETRIES,
        }
    }

    /// Override the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of `endpoint`
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Execute GET request and decode the JSON body
    ///
    /// # Errors
    /// Returns FetcherError on network, HTTP status or decode failures
    pub async fn get_json<T>(&self, endpoint: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send_with_retry(endpoint, params).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| FetcherError::ParseError(format!("Failed to deserialize response: {e}")))
    }

    /// Execute GET request and return the body as a chunk stream
    pub async fn get_stream(&self, endpoint: &str, params: &[(&str, String)]) -> FetcherResult<PhotoStream> {
        let response = self.send_with_retry(endpoint, params).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| FetcherError::NetworkError(e.to_string())));
        Ok(Box::pin(stream))
    }

    /// Send a GET, retrying on:
    /// - Network errors (timeout, connection refused)
    /// - 5xx server errors
    /// - 429 rate limit errors
    ///
    /// Other non-success statuses fail immediately.
    async fn send_with_retry(&self, endpoint: &str, params: &[(&str, String)]) -> FetcherResult<Response> {
        let url = self.url(endpoint);
        let mut last_error = None;

        // The key travels in the query string, so only the bare URL is logged.
        debug!("Making GET request to: {} with {} params", url, params.len());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = calculate_backoff(attempt - 1);
                debug!("Retrying after {:?}", backoff);
                tokio::time::sleep(backoff).await;
            }

            let response = match self.client.get(&url).query(params).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    let e = e.without_url();
                    warn!(
                        "Network error on attempt {}/{}: {}",
                        attempt + 1,
                        self.max_retries + 1,
                        e
                    );
                    last_error = Some(FetcherError::NetworkError(e.to_string()));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 {
                warn!(
                    "Rate limit error (429) on attempt {}/{}",
                    attempt + 1,
                    self.max_retries + 1
                );
                last_error = Some(FetcherError::RateLimitExceeded);
                continue;
            }

            if status.is_server_error() {
                warn!(
                    "Server error {} on attempt {}/{}",
                    status,
                    attempt + 1,
                    self.max_retries + 1
                );
                last_error = Some(FetcherError::HttpError(format!("Server error: {status}")));
                continue;
            }

            if !status.is_success() {
                return Err(FetcherError::HttpError(format!("Unexpected status {status}")));
            }

            debug!("Request succeeded on attempt {}", attempt + 1);
            return Ok(response);
        }

        Err(last_error.unwrap_or_else(|| FetcherError::NetworkError("All retries exhausted".to_string())))
    }
}
