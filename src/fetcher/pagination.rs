//! Pagination helper for nearby search
//!
//! Nearby search returns at most one page per call plus a continuation token.
//! A fresh token only becomes valid a few seconds after it was issued, so the
//! helper waits before every follow-up page. Safety mechanisms:
//! - The result limit bounds the number of pages requested
//! - An empty page with a token is followed like any other page
//! - The token delay is raced against cancellation

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::fetcher::{FetcherError, NearbySearchRequest, PlacesApi};
use crate::quota::{ApiCategory, ApiUsage};
use crate::shutdown::ShutdownCoordinator;
use crate::{LatLng, PlaceCandidate};

/// Result of a paginated search
///
/// Candidates gathered before a failure are kept; `failure` carries the error
/// that ended pagination early, if any.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    /// Accumulated candidates, truncated to the result limit
    pub candidates: Vec<PlaceCandidate>,
    /// Error that aborted pagination
    pub failure: Option<FetcherError>,
    /// Whether pagination stopped on a cancellation request
    pub cancelled: bool,
}

impl SearchOutcome {
    /// Whether pagination ran to completion without errors
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && !self.cancelled
    }
}

/// Pagination helper for Places search requests
pub struct PaginationHelper;

impl PaginationHelper {
    /// Collect up to `result_limit` candidates around `center`
    ///
    /// # Arguments
    /// * `api` - Places API implementation
    /// * `center` - Search center
    /// * `radius_meters` - Search radius in meters
    /// * `result_limit` - Maximum number of candidates to return
    /// * `token_delay` - Wait before requesting a page by token
    /// * `shutdown` - Cancellation flag checked during the token wait
    /// * `usage` - Counts one nearby search call per page request
    ///
    /// The first page is always requested, so a limit of 0 still costs one call.
    pub async fn paginate_nearby_search(
        api: &dyn PlacesApi,
        center: LatLng,
        radius_meters: u32,
        result_limit: usize,
        token_delay: Duration,
        shutdown: &ShutdownCoordinator,
        usage: &mut ApiUsage,
    ) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        let mut request = NearbySearchRequest::first_page(center, radius_meters);
        let mut page_number = 0usize;

        loop {
            page_number += 1;
            debug!(
                page = page_number,
                accumulated = outcome.candidates.len(),
                "Fetching nearby search page"
            );

            let result = api.nearby_search(&request).await;
            usage.record(ApiCategory::NearbySearch);

            let page = match result.and_then(|page| page.ensure_ok().map(|()| page)) {
                Ok(page) => page,
                Err(e) => {
                    warn!(page = page_number, error = %e, "Nearby search failed");
                    outcome.failure = Some(e);
                    break;
                }
            };

            debug!("Received {} places in page {}", page.results.len(), page_number);
            outcome.candidates.extend(page.results);

            if outcome.candidates.len() >= result_limit {
                debug!("Result limit {} reached", result_limit);
                break;
            }

            let Some(token) = page.next_page_token else {
                debug!("No continuation token, pagination complete");
                break;
            };

            tokio::select! {
                _ = tokio::time::sleep(token_delay) => {}
                _ = shutdown.wait_for_shutdown() => {
                    info!("Search cancelled while waiting for page token");
                    outcome.cancelled = true;
                    break;
                }
            }

            request.page_token = Some(token);
        }

        outcome.candidates.truncate(result_limit);
        debug!(
            "Pagination completed after {} pages. Total places: {}",
            page_number,
            outcome.candidates.len()
        );
        outcome
    }
}
