//! Places API response parser
//!
//! Stateless conversion of the JSON bodies returned by the nearby search and
//! place details endpoints into typed pages. The `status` envelope is kept on
//! the page so callers decide how to treat a non-OK answer.

use crate::fetcher::{FetcherError, FetcherResult};
use crate::{PhotoRef, PlaceCandidate, Review};
use serde_json::Value;
use std::str::FromStr;

/// Status field of a Places API response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    /// Request succeeded
    Ok,
    /// Request succeeded but matched nothing
    ZeroResults,
    /// Quota or billing limit hit
    OverQueryLimit,
    /// Key missing, invalid or not authorised
    RequestDenied,
    /// Missing or malformed parameters, or an expired page token
    InvalidRequest,
    /// Place id no longer exists
    NotFound,
    /// Server side error, may succeed on retry
    UnknownError,
    /// Any other status string
    Other(String),
}

impl ApiStatus {
    /// Whether the status is `OK`
    pub fn is_ok(&self) -> bool {
        matches!(self, ApiStatus::Ok)
    }
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApiStatus::Ok => "OK",
            ApiStatus::ZeroResults => "ZERO_RESULTS",
            ApiStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            ApiStatus::RequestDenied => "REQUEST_DENIED",
            ApiStatus::InvalidRequest => "INVALID_REQUEST",
            ApiStatus::NotFound => "NOT_FOUND",
            ApiStatus::UnknownError => "UNKNOWN_ERROR",
            ApiStatus::Other(other) => other.as_str(),
        };
        write!(f, "{s}")
    }
}

impl FromStr for ApiStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "OK" => ApiStatus::Ok,
            "ZERO_RESULTS" => ApiStatus::ZeroResults,
            "OVER_QUERY_LIMIT" => ApiStatus::OverQueryLimit,
            "REQUEST_DENIED" => ApiStatus::RequestDenied,
            "INVALID_REQUEST" => ApiStatus::InvalidRequest,
            "NOT_FOUND" => ApiStatus::NotFound,
            "UNKNOWN_ERROR" => ApiStatus::UnknownError,
            "" => return Err("Empty status".to_string()),
            other => ApiStatus::Other(other.to_string()),
        })
    }
}

/// One page of nearby search results
#[derive(Debug, Clone, PartialEq)]
pub struct NearbySearchPage {
    /// Response status
    pub status: ApiStatus,
    /// Places on this page
    pub results: Vec<PlaceCandidate>,
    /// Token for the next page; empty tokens are normalised to `None`
    pub next_page_token: Option<String>,
    /// Error text accompanying a non-OK status
    pub error_message: Option<String>,
}

impl NearbySearchPage {
    /// Turn a non-OK status into [`FetcherError::ApiError`]
    pub fn ensure_ok(&self) -> FetcherResult<()> {
        ensure_ok(&self.status, &self.error_message)
    }
}

/// Details of a single place
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetailsPage {
    /// Response status
    pub status: ApiStatus,
    /// `result.reviews`, `None` when the field is absent
    pub reviews: Option<Vec<Review>>,
    /// `result.photos`, `None` when the field is absent
    pub photos: Option<Vec<PhotoRef>>,
    /// Error text accompanying a non-OK status
    pub error_message: Option<String>,
}

impl PlaceDetailsPage {
    /// Turn a non-OK status into [`FetcherError::ApiError`]
    pub fn ensure_ok(&self) -> FetcherResult<()> {
        ensure_ok(&self.status, &self.error_message)
    }
}

fn ensure_ok(status: &ApiStatus, error_message: &Option<String>) -> FetcherResult<()> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(FetcherError::ApiError {
            status: status.clone(),
            message: error_message.clone(),
        })
    }
}

/// Stateless parser for Places API responses
pub struct PlacesParser;

impl PlacesParser {
    /// Parse a nearby search response body
    ///
    /// Results are only read when the status is OK; an error response may omit them.
    pub fn parse_nearby_search(body: &Value) -> FetcherResult<NearbySearchPage> {
        let status = Self::parse_status(body)?;
        let error_message = Self::optional_str(body, "error_message");

        let next_page_token =
            Self::optional_str(body, "next_page_token").filter(|token| !token.is_empty());

        let results = if status.is_ok() {
            body.get("results")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .map(Self::parse_candidate)
                        .collect::<FetcherResult<Vec<_>>>()
                })
                .transpose()?
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(NearbySearchPage {
            status,
            results,
            next_page_token,
            error_message,
        })
    }

    /// Parse a place details response body
    pub fn parse_place_details(body: &Value) -> FetcherResult<PlaceDetailsPage> {
        let status = Self::parse_status(body)?;
        let error_message = Self::optional_str(body, "error_message");

        let result = body.get("result");
        let reviews = result
            .and_then(|r| r.get("reviews"))
            .map(|reviews| {
                reviews
                    .as_array()
                    .ok_or_else(|| FetcherError::ParseError("reviews is not an array".to_string()))?
                    .iter()
                    .map(Self::parse_review)
                    .collect::<FetcherResult<Vec<_>>>()
            })
            .transpose()?;
        let photos = result
            .and_then(|r| r.get("photos"))
            .map(|photos| {
                photos
                    .as_array()
                    .ok_or_else(|| FetcherError::ParseError("photos is not an array".to_string()))?
                    .iter()
                    .map(Self::parse_photo)
                    .collect::<FetcherResult<Vec<_>>>()
            })
            .transpose()?;

        Ok(PlaceDetailsPage {
            status,
            reviews,
            photos,
            error_message,
        })
    }

    /// Parse one entry of `results`
    pub fn parse_candidate(value: &Value) -> FetcherResult<PlaceCandidate> {
        let location = value
            .get("geometry")
            .and_then(|g| g.get("location"))
            .ok_or_else(|| FetcherError::ParseError("Missing geometry.location".to_string()))?;

        let latitude = location
            .get("lat")
            .and_then(Value::as_f64)
            .ok_or_else(|| FetcherError::ParseError("Invalid geometry.location.lat".to_string()))?;
        let longitude = location
            .get("lng")
            .and_then(Value::as_f64)
            .ok_or_else(|| FetcherError::ParseError("Invalid geometry.location.lng".to_string()))?;

        let place_id = Self::required_str(value, "place_id")?;
        let name = Self::optional_str(value, "name").unwrap_or_default();
        let types = value
            .get("types")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(PlaceCandidate {
            latitude,
            longitude,
            name,
            place_id,
            types,
        })
    }

    fn parse_review(value: &Value) -> FetcherResult<Review> {
        let unix_timestamp = value
            .get("time")
            .and_then(Value::as_i64)
            .ok_or_else(|| FetcherError::ParseError("Invalid review time".to_string()))?;

        Ok(Review {
            author_name: Self::optional_str(value, "author_name").unwrap_or_default(),
            text: Self::optional_str(value, "text").unwrap_or_default(),
            unix_timestamp,
        })
    }

    fn parse_photo(value: &Value) -> FetcherResult<PhotoRef> {
        let dimension = |key: &str| -> FetcherResult<u32> {
            value
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| FetcherError::ParseError(format!("Invalid photo {key}")))
        };

        Ok(PhotoRef {
            photo_reference: Self::required_str(value, "photo_reference")?,
            width: dimension("width")?,
            height: dimension("height")?,
        })
    }

    fn parse_status(body: &Value) -> FetcherResult<ApiStatus> {
        let raw = body
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| FetcherError::ParseError("Missing status field".to_string()))?;
        ApiStatus::from_str(raw).map_err(FetcherError::ParseError)
    }

    fn required_str(value: &Value, key: &str) -> FetcherResult<String> {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| FetcherError::ParseError(format!("Missing {key}")))
    }

    fn optional_str(value: &Value, key: &str) -> Option<String> {
        value.get(key).and_then(Value::as_str).map(str::to_string)
    }
}
