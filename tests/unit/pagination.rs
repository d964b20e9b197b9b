//! Nearby search pagination

use std::time::Duration;

use places_downloader::downloader::config::PAGE_TOKEN_DELAY;
use places_downloader::fetcher::{ApiStatus, FetcherError, PaginationHelper, SearchOutcome};
use places_downloader::quota::ApiUsage;
use places_downloader::shutdown::ShutdownCoordinator;
use places_downloader::{DownloadJob, LatLng};

use crate::support::{search_error, search_page, MockPlacesApi};

async fn search(api: &MockPlacesApi, limit: usize, delay: Duration) -> (SearchOutcome, ApiUsage) {
    let shutdown = ShutdownCoordinator::new();
    let mut usage = ApiUsage::default();
    let outcome = PaginationHelper::paginate_nearby_search(
        api,
        LatLng::new(12.97, 77.59),
        2000,
        limit,
        delay,
        &shutdown,
        &mut usage,
    )
    .await;
    (outcome, usage)
}

#[tokio::test]
async fn test_call_count_follows_tokens() {
    // zero tokens
    let api = MockPlacesApi::new().with_search_page(search_page(&["a"], None));
    let (_, usage) = search(&api, 100, Duration::ZERO).await;
    assert_eq!(usage.nearby_search_calls, 1);

    // one token
    let api = MockPlacesApi::new()
        .with_search_page(search_page(&["a"], Some("t1")))
        .with_search_page(search_page(&["b"], None));
    let (_, usage) = search(&api, 100, Duration::ZERO).await;
    assert_eq!(usage.nearby_search_calls, 2);

    // three consecutive tokens
    let api = MockPlacesApi::new()
        .with_search_page(search_page(&["a"], Some("t1")))
        .with_search_page(search_page(&["b"], Some("t2")))
        .with_search_page(search_page(&["c"], Some("t3")))
        .with_search_page(search_page(&["d"], None));
    let (outcome, usage) = search(&api, 100, Duration::ZERO).await;
    assert_eq!(usage.nearby_search_calls, 4);
    assert_eq!(outcome.candidates.len(), 4);

    let tokens: Vec<_> = api
        .search_requests()
        .into_iter()
        .map(|r| r.page_token)
        .collect();
    assert_eq!(
        tokens,
        vec![None, Some("t1".into()), Some("t2".into()), Some("t3".into())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_token_validity() {
    let api = MockPlacesApi::new()
        .with_search_page(search_page(&["a"], Some("t1")))
        .with_search_page(search_page(&["b"], Some("t2")))
        .with_search_page(search_page(&["c"], None));

    let start = tokio::time::Instant::now();
    let (outcome, _) = search(&api, 100, PAGE_TOKEN_DELAY).await;

    assert_eq!(outcome.candidates.len(), 3);
    assert!(start.elapsed() >= PAGE_TOKEN_DELAY * 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_wait_without_token() {
    let api = MockPlacesApi::new().with_search_page(search_page(&["a", "b"], None));

    let start = tokio::time::Instant::now();
    search(&api, 100, PAGE_TOKEN_DELAY).await;

    assert!(start.elapsed() < PAGE_TOKEN_DELAY);
}

#[tokio::test(start_paused = true)]
async fn test_no_wait_once_limit_reached() {
    let api = MockPlacesApi::new()
        .with_search_page(search_page(&["a", "b", "c"], Some("t1")))
        .with_search_page(search_page(&["d"], None));

    let start = tokio::time::Instant::now();
    let (outcome, usage) = search(&api, 2, PAGE_TOKEN_DELAY).await;

    assert_eq!(usage.nearby_search_calls, 1);
    assert_eq!(outcome.candidates.len(), 2);
    assert!(start.elapsed() < PAGE_TOKEN_DELAY);
}

#[tokio::test]
async fn test_empty_page_with_token_is_followed() {
    let api = MockPlacesApi::new()
        .with_search_page(search_page(&[], Some("t1")))
        .with_search_page(search_page(&["a"], None));

    let (outcome, usage) = search(&api, 5, Duration::ZERO).await;

    assert_eq!(usage.nearby_search_calls, 2);
    assert_eq!(outcome.candidates.len(), 1);
    assert!(outcome.is_complete());
    assert_eq!(api.search_requests()[1].page_token.as_deref(), Some("t1"));
}

#[tokio::test]
async fn test_truncates_to_limit() {
    let api = MockPlacesApi::new()
        .with_search_page(search_page(&["a", "b"], Some("t1")))
        .with_search_page(search_page(&["c", "d"], None));

    let (outcome, _) = search(&api, 3, Duration::ZERO).await;

    let ids: Vec<_> = outcome.candidates.iter().map(|c| c.place_id.clone()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_status_error_keeps_accumulated() {
    let api = MockPlacesApi::new()
        .with_search_page(search_page(&["a", "b"], Some("t1")))
        .with_search_page(search_error(ApiStatus::InvalidRequest, "token not ready"));

    let (outcome, usage) = search(&api, 10, Duration::ZERO).await;

    assert_eq!(outcome.candidates.len(), 2);
    assert_eq!(usage.nearby_search_calls, 2);
    match outcome.failure {
        Some(FetcherError::ApiError { status, message }) => {
            assert_eq!(status, ApiStatus::InvalidRequest);
            assert_eq!(message.as_deref(), Some("token not ready"));
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_error_on_first_page() {
    let api = MockPlacesApi::new().with_search_error(FetcherError::NetworkError("timeout".to_string()));

    let (outcome, usage) = search(&api, 10, Duration::ZERO).await;

    assert!(outcome.candidates.is_empty());
    assert!(matches!(outcome.failure, Some(FetcherError::NetworkError(_))));
    assert_eq!(usage.nearby_search_calls, 1);
}

#[tokio::test]
async fn test_radius_sent_in_meters() {
    for radius_km in [0u32, 1, 2, 25, 50] {
        let job = DownloadJob::new(LatLng::new(0.0, 0.0), radius_km, 5, "k", "w", "a.xlsx", "d", false);
        let api = MockPlacesApi::new().with_search_page(search_page(&[], None));
        let shutdown = ShutdownCoordinator::new();
        let mut usage = ApiUsage::default();

        PaginationHelper::paginate_nearby_search(
            &api,
            job.center,
            job.radius_meters(),
            job.result_limit,
            Duration::ZERO,
            &shutdown,
            &mut usage,
        )
        .await;

        assert_eq!(api.search_requests()[0].radius_meters, radius_km * 1000);
    }
}
