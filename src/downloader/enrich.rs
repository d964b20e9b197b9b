//! Place enrichment
//!
//! Looks up reviews and photo references for every search candidate. Failures
//! are per place: they are reported as messages and the place is dropped.

use tracing::debug;

use crate::downloader::events::EventSink;
use crate::downloader::progress::enrichment_progress;
use crate::fetcher::PlacesApi;
use crate::quota::{ApiCategory, ApiUsage};
use crate::shutdown::ShutdownCoordinator;
use crate::{EnrichedPlace, PlaceCandidate};

/// Fetches place details for search candidates
pub struct PlaceEnricher<'a> {
    api: &'a dyn PlacesApi,
}

impl<'a> PlaceEnricher<'a> {
    /// Create an enricher over `api`
    pub fn new(api: &'a dyn PlacesApi) -> Self {
        Self { api }
    }

    /// Enrich one candidate
    ///
    /// Returns `None` when the lookup fails or the place has no reviews.
    /// Never fails outward.
    pub async fn enrich(
        &self,
        candidate: PlaceCandidate,
        usage: &mut ApiUsage,
        events: &EventSink,
    ) -> Option<EnrichedPlace> {
        let place_id = candidate.place_id.clone();
        let result = self.api.place_details(&place_id).await;
        usage.record(ApiCategory::PlaceDetails);

        let details = match result.and_then(|page| page.ensure_ok().map(|()| page)) {
            Ok(details) => details,
            Err(e) => {
                events.message(format!(
                    "Error fetching review and/or photos for place: {place_id}. {}",
                    e.user_message()
                ));
                return None;
            }
        };

        let Some(reviews) = details.reviews else {
            events.message(format!("No reviews found for place: {place_id}"));
            return None;
        };
        events.message(format!("Fetched reviews for place: {place_id}"));

        let photos = match details.photos {
            Some(photos) => {
                events.message(format!("Fetched photos for place: {place_id}"));
                photos
            }
            None => {
                events.message(format!("No photos found for place: {place_id}"));
                Vec::new()
            }
        };

        debug!(
            place_id = %place_id,
            reviews = reviews.len(),
            photos = photos.len(),
            "Place enriched"
        );

        Some(EnrichedPlace {
            candidate,
            reviews,
            photos,
        })
    }

    /// Enrich candidates in order, reporting progress after each one
    ///
    /// Cancellation is checked before every candidate; `None` means the
    /// run was stopped.
    pub async fn enrich_all(
        &self,
        candidates: Vec<PlaceCandidate>,
        shutdown: &ShutdownCoordinator,
        usage: &mut ApiUsage,
        events: &mut EventSink,
    ) -> Option<Vec<EnrichedPlace>> {
        let total = candidates.len();
        let mut enriched = Vec::with_capacity(total);

        for (index, candidate) in candidates.into_iter().enumerate() {
            if shutdown.is_shutdown_requested() {
                debug!(completed = index, total, "Enrichment cancelled");
                return None;
            }

            if let Some(place) = self.enrich(candidate, usage, events).await {
                enriched.push(place);
            }
            events.progress(enrichment_progress(index + 1, total));
        }

        Some(enriched)
    }
}
