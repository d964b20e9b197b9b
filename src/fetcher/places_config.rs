//! Google Places web service configuration
//!
//! Endpoint paths and request constants for the legacy Places API
//! (`maps/api/place/*`). The base URL is overridable so the client can be
//! pointed at a proxy or a local stub.

/// Default base URL of the Places web service
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Endpoint paths relative to the base URL
#[derive(Debug, Clone)]
pub struct PlacesEndpoints {
    /// Nearby search endpoint (JSON output)
    pub nearby_search: &'static str,
    /// Place details endpoint (JSON output)
    pub place_details: &'static str,
    /// Place photo endpoint (binary output)
    pub place_photo: &'static str,
}

/// Endpoints of the Places web service
pub const PLACES_ENDPOINTS: PlacesEndpoints = PlacesEndpoints {
    nearby_search: "/nearbysearch/json",
    place_details: "/details/json",
    place_photo: "/photo",
};

/// Fields requested from the details endpoint. Billing depends on this list.
pub const DETAIL_FIELDS: [&str; 2] = ["review", "photo"];

/// Value of the `fields` query parameter for details requests
pub fn detail_fields_param() -> String {
    DETAIL_FIELDS.join(",")
}
