//! # Places Downloader Library
//!
//! Downloads points of interest around a location from the Google Places API,
//! enriches every place with its reviews and photo references, exports the
//! result to a two-sheet xlsx workbook and optionally saves the photos.
//!
//! ## Features
//!
//! - **Paginated nearby search**: honours the page-token validity delay
//! - **Enrichment**: reviews and photo references per place, places without
//!   reviews are dropped
//! - **Spreadsheet export**: a formatted sheet with merged place blocks and a
//!   flat sheet with one row per review
//! - **Photo download**: streamed to disk in fixed-size chunks
//! - **Quota tracking**: per-category API call counters, reset monthly
//! - **Cooperative cancellation**: a stop request is observed between units of work
//!
//! ## Quick Start
//!
//! ```no_run
//! use places_downloader::downloader::{DownloadJob, DownloadWorker};
//! use places_downloader::fetcher::create_places_api;
//! use places_downloader::quota::FileQuotaLedger;
//! use places_downloader::LatLng;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let job = DownloadJob::new(
//!     LatLng::new(12.97, 77.59),
//!     2,
//!     20,
//!     "my-api-key",
//!     "cafe",
//!     "./reviews.xlsx",
//!     "./photos",
//!     true,
//! );
//!
//! let api = create_places_api(&job.api_key);
//! let ledger = Arc::new(FileQuotaLedger::new("usage.dat"));
//! let handle = DownloadWorker::new(job, api, ledger).spawn();
//! let result = handle.join().await?;
//! println!("{} places", result.places.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Places API transport, response parsing and search pagination
//! - [`downloader`] - Worker orchestration, enrichment, photo download, progress
//! - [`output`] - Workbook export
//! - [`quota`] - Persisted API usage counters
//! - [`prefs`] - Persisted last-used inputs
//! - [`cli`] - Command line front end

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// CLI command implementations
pub mod cli;

/// Worker orchestration
pub mod downloader;

/// Places API access
pub mod fetcher;

/// Key/value file format shared by the quota ledger and preferences
pub mod kv;

/// Report writers
pub mod output;

/// Persisted user inputs
pub mod prefs;

/// API usage ledger
pub mod quota;

/// Cooperative cancellation shared across modules
pub mod shutdown;

pub use downloader::{DownloadJob, DownloadWorker, RunResult, RunStatus};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

impl LatLng {
    /// Create a coordinate pair
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that both components are inside their ranges
    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err("latitude must lie between -90 and 90 degrees".to_string());
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err("longitude must lie between -180 and 180 degrees".to_string());
        }
        Ok(())
    }

    /// Format as the `lat,lng` pair the Places API expects
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// A place returned by the nearby search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    /// Latitude of the place
    pub latitude: f64,
    /// Longitude of the place
    pub longitude: f64,
    /// Display name
    pub name: String,
    /// Places API identifier, unique within one search
    pub place_id: String,
    /// Place categories in API order
    pub types: Vec<String>,
}

impl PlaceCandidate {
    /// Validate candidate data integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.place_id.is_empty() {
            return Err("Place id cannot be empty".to_string());
        }
        LatLng::new(self.latitude, self.longitude).validate()
    }

    /// Categories joined the way the report shows them
    pub fn types_joined(&self) -> String {
        self.types.join(", ")
    }
}

/// A user review attached to a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer display name
    pub author_name: String,
    /// Review body
    pub text: String,
    /// Unix timestamp in seconds
    pub unix_timestamp: i64,
}

/// Reference to a photo that can be fetched from the photo endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    /// Opaque photo reference
    pub photo_reference: String,
    /// Declared width in pixels
    pub width: u32,
    /// Declared height in pixels
    pub height: u32,
}

/// A candidate together with its reviews and photo references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPlace {
    /// The search result this place was built from
    pub candidate: PlaceCandidate,
    /// Reviews in API order
    pub reviews: Vec<Review>,
    /// Photo references in API order
    pub photos: Vec<PhotoRef>,
}

impl EnrichedPlace {
    /// Place identifier of the underlying candidate
    pub fn place_id(&self) -> &str {
        &self.candidate.place_id
    }
}
