//! Google Places fetcher
//!
//! [`PlacesApi`] implementation backed by [`PlacesHttpClient`].

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::fetcher::places_config::{detail_fields_param, DEFAULT_BASE_URL, PLACES_ENDPOINTS};
use crate::fetcher::places_http::PlacesHttpClient;
use crate::fetcher::places_parser::PlacesParser;
use crate::fetcher::shared_resources::global_http_client;
use crate::fetcher::{
    FetcherResult, NearbySearchPage, NearbySearchRequest, PhotoStream, PlaceDetailsPage, PlacesApi,
};
use crate::PhotoRef;

/// Places web service fetcher
pub struct GooglePlacesFetcher {
    http: PlacesHttpClient,
    api_key: String,
}

impl GooglePlacesFetcher {
    /// Create a fetcher against the public endpoint using the shared client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(global_http_client(), DEFAULT_BASE_URL, api_key)
    }

    /// Create a fetcher against a custom base URL
    pub fn with_base_url(client: Arc<Client>, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: PlacesHttpClient::new(client, base_url),
            api_key: api_key.into(),
        }
    }

    /// Query parameters of a nearby search page
    pub fn nearby_search_params(&self, request: &NearbySearchRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("location", request.location.to_query_value()),
            ("radius", request.radius_meters.to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(token) = &request.page_token {
            params.push(("pagetoken", token.clone()));
        }
        params
    }

    /// Query parameters of a details request
    pub fn place_details_params(&self, place_id: &str) -> Vec<(&'static str, String)> {
        vec![
            ("place_id", place_id.to_string()),
            ("fields", detail_fields_param()),
            ("key", self.api_key.clone()),
        ]
    }

    /// Query parameters of a photo request
    pub fn place_photo_params(&self, photo: &PhotoRef) -> Vec<(&'static str, String)> {
        vec![
            ("photoreference", photo.photo_reference.clone()),
            ("maxwidth", photo.width.to_string()),
            ("maxheight", photo.height.to_string()),
            ("key", self.api_key.clone()),
        ]
    }
}

#[async_trait]
impl PlacesApi for GooglePlacesFetcher {
    async fn nearby_search(&self, request: &NearbySearchRequest) -> FetcherResult<NearbySearchPage> {
        let params = self.nearby_search_params(request);
        debug!(
            radius = request.radius_meters,
            has_token = request.page_token.is_some(),
            "Requesting nearby search page"
        );
        let body: Value = self.http.get_json(PLACES_ENDPOINTS.nearby_search, &params).await?;
        PlacesParser::parse_nearby_search(&body)
    }

    async fn place_details(&self, place_id: &str) -> FetcherResult<PlaceDetailsPage> {
        let params = self.place_details_params(place_id);
        let body: Value = self.http.get_json(PLACES_ENDPOINTS.place_details, &params).await?;
        PlacesParser::parse_place_details(&body)
    }

    async fn place_photo(&self, photo: &PhotoRef) -> FetcherResult<PhotoStream> {
        let params = self.place_photo_params(photo);
        self.http.get_stream(PLACES_ENDPOINTS.place_photo, &params).await
    }

    fn base_url(&self) -> &str {
        self.http.base_url()
    }
}
