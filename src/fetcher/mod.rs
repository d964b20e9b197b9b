//! Places API access
//!
//! The worker talks to the Places web service only through the [`PlacesApi`]
//! trait. [`google_places::GooglePlacesFetcher`] is the HTTP implementation;
//! tests substitute scripted implementations.

use crate::{LatLng, PhotoRef};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;

pub mod google_places;
pub mod pagination;
pub mod places_config;
pub mod places_http;
pub mod places_parser;
pub mod shared_resources;

pub use pagination::{PaginationHelper, SearchOutcome};
pub use places_parser::{ApiStatus, NearbySearchPage, PlaceDetailsPage};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),

    /// The API answered with a non-OK status
    #[error("API error: {status}{}", api_message_suffix(.message))]
    ApiError {
        /// Status reported by the API
        status: ApiStatus,
        /// `error_message` from the response, if any
        message: Option<String>,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),
}

fn api_message_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(". {m}"),
        _ => String::new(),
    }
}

impl FetcherError {
    /// Short text for user-facing notifications
    ///
    /// API errors prefer the service's own `error_message`.
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiError {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            Self::ApiError { status, .. } => status.to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Stream of photo body chunks
pub type PhotoStream = Pin<Box<dyn Stream<Item = FetcherResult<Bytes>> + Send>>;

/// Parameters of one nearby search page
#[derive(Debug, Clone, PartialEq)]
pub struct NearbySearchRequest {
    /// Search center
    pub location: LatLng,
    /// Search radius in meters
    pub radius_meters: u32,
    /// Continuation token from the previous page
    pub page_token: Option<String>,
}

impl NearbySearchRequest {
    /// Request for the first page
    pub fn first_page(location: LatLng, radius_meters: u32) -> Self {
        Self {
            location,
            radius_meters,
            page_token: None,
        }
    }
}

/// Places web service operations used by the worker
#[async_trait]
pub trait PlacesApi: Send + Sync {
    /// Fetch one page of nearby search results
    ///
    /// A non-OK status is returned inside the page, not as an error; only
    /// transport and decoding failures are errors.
    async fn nearby_search(&self, request: &NearbySearchRequest) -> FetcherResult<NearbySearchPage>;

    /// Fetch reviews and photo references of a place
    ///
    /// Same status convention as [`PlacesApi::nearby_search`].
    async fn place_details(&self, place_id: &str) -> FetcherResult<PlaceDetailsPage>;

    /// Open the binary stream of a photo, sized by the photo's declared dimensions
    ///
    /// Any response other than 200 is an error.
    async fn place_photo(&self, photo: &PhotoRef) -> FetcherResult<PhotoStream>;

    /// Base URL requests are sent to
    fn base_url(&self) -> &str;
}

/// Create the HTTP implementation for `api_key` against the public endpoint
pub fn create_places_api(api_key: &str) -> Arc<dyn PlacesApi> {
    Arc::new(google_places::GooglePlacesFetcher::new(api_key))
}
