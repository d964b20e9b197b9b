//! Scripted Places API and in-memory ledger shared by the test suites

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use places_downloader::downloader::WorkerEvent;
use places_downloader::fetcher::{
    ApiStatus, FetcherError, FetcherResult, NearbySearchPage, NearbySearchRequest, PhotoStream,
    PlaceDetailsPage, PlacesApi,
};
use places_downloader::quota::{QuotaCounters, QuotaError, QuotaLedger};
use places_downloader::{PhotoRef, PlaceCandidate, Review};

type DetailsHook = Box<dyn Fn(usize) + Send + Sync>;

/// Places API answering from scripted responses
#[derive(Default)]
pub struct MockPlacesApi {
    search_pages: Mutex<VecDeque<FetcherResult<NearbySearchPage>>>,
    details: Mutex<HashMap<String, PlaceDetailsPage>>,
    photos: Mutex<HashMap<String, Vec<u8>>>,
    search_requests: Mutex<Vec<NearbySearchRequest>>,
    details_requests: Mutex<Vec<String>>,
    photo_requests: Mutex<Vec<PhotoRef>>,
    details_calls: AtomicUsize,
    on_details: Option<DetailsHook>,
}

impl MockPlacesApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a search page
    pub fn with_search_page(self, page: NearbySearchPage) -> Self {
        self.search_pages.lock().unwrap().push_back(Ok(page));
        self
    }

    /// Queue a transport failure for the next search call
    pub fn with_search_error(self, error: FetcherError) -> Self {
        self.search_pages.lock().unwrap().push_back(Err(error));
        self
    }

    /// Details returned for `place_id`; unknown ids answer NOT_FOUND
    pub fn with_details(self, place_id: &str, page: PlaceDetailsPage) -> Self {
        self.details.lock().unwrap().insert(place_id.to_string(), page);
        self
    }

    /// Body served for `photo_reference`; unknown references answer HTTP 404
    pub fn with_photo(self, photo_reference: &str, body: &[u8]) -> Self {
        self.photos
            .lock()
            .unwrap()
            .insert(photo_reference.to_string(), body.to_vec());
        self
    }

    /// Called with the 1-based call number after every details request
    pub fn on_details_call(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_details = Some(Box::new(hook));
        self
    }

    pub fn search_requests(&self) -> Vec<NearbySearchRequest> {
        self.search_requests.lock().unwrap().clone()
    }

    pub fn details_requests(&self) -> Vec<String> {
        self.details_requests.lock().unwrap().clone()
    }

    pub fn photo_requests(&self) -> Vec<PhotoRef> {
        self.photo_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesApi for MockPlacesApi {
    async fn nearby_search(&self, request: &NearbySearchRequest) -> FetcherResult<NearbySearchPage> {
        self.search_requests.lock().unwrap().push(request.clone());
        self.search_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(search_page(&[], None)))
    }

    async fn place_details(&self, place_id: &str) -> FetcherResult<PlaceDetailsPage> {
        self.details_requests.lock().unwrap().push(place_id.to_string());
        let call = self.details_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let page = self
            .details
            .lock()
            .unwrap()
            .get(place_id)
            .cloned()
            .unwrap_or_else(|| details_error(ApiStatus::NotFound, "Place not found"));
        if let Some(hook) = &self.on_details {
            hook(call);
        }
        Ok(page)
    }

    async fn place_photo(&self, photo: &PhotoRef) -> FetcherResult<PhotoStream> {
        self.photo_requests.lock().unwrap().push(photo.clone());
        let body = self.photos.lock().unwrap().get(&photo.photo_reference).cloned();
        match body {
            Some(body) => {
                let chunks: Vec<FetcherResult<Bytes>> =
                    body.chunks(1000).map(|c| Ok(Bytes::copy_from_slice(c))).collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            None => Err(FetcherError::HttpError("Unexpected status 404 Not Found".to_string())),
        }
    }

    fn base_url(&self) -> &str {
        "mock://places"
    }
}

/// Ledger kept in memory
#[derive(Default)]
pub struct MemoryLedger {
    stored: Mutex<Option<QuotaCounters>>,
    pub fail_saves: bool,
}

impl MemoryLedger {
    pub fn with_counters(counters: QuotaCounters) -> Self {
        Self {
            stored: Mutex::new(Some(counters)),
            fail_saves: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            stored: Mutex::new(None),
            fail_saves: true,
        }
    }

    pub fn stored(&self) -> Option<QuotaCounters> {
        *self.stored.lock().unwrap()
    }
}

impl QuotaLedger for MemoryLedger {
    fn load(&self) -> Result<QuotaCounters, QuotaError> {
        Ok(self
            .stored()
            .unwrap_or_else(|| QuotaCounters::zero(places_downloader::quota::current_month())))
    }

    fn save(&self, counters: &QuotaCounters) -> Result<(), QuotaError> {
        if self.fail_saves {
            return Err(QuotaError::InvalidMonth(0));
        }
        *self.stored.lock().unwrap() = Some(*counters);
        Ok(())
    }
}

pub fn candidate(id: &str) -> PlaceCandidate {
    PlaceCandidate {
        latitude: 12.97,
        longitude: 77.59,
        name: format!("Place {id}"),
        place_id: id.to_string(),
        types: vec!["cafe".to_string(), "food".to_string()],
    }
}

pub fn search_page(ids: &[&str], token: Option<&str>) -> NearbySearchPage {
    NearbySearchPage {
        status: ApiStatus::Ok,
        results: ids.iter().map(|id| candidate(id)).collect(),
        next_page_token: token.map(str::to_string),
        error_message: None,
    }
}

pub fn search_error(status: ApiStatus, message: &str) -> NearbySearchPage {
    NearbySearchPage {
        status,
        results: vec![],
        next_page_token: None,
        error_message: Some(message.to_string()),
    }
}

pub fn review(i: usize) -> Review {
    Review {
        author_name: format!("Author {i}"),
        text: format!("Review text {i}"),
        unix_timestamp: 1_700_000_000 + i as i64 * 86_400,
    }
}

pub fn photo_ref(reference: &str) -> PhotoRef {
    PhotoRef {
        photo_reference: reference.to_string(),
        width: 400,
        height: 300,
    }
}

pub fn details(reviews: usize, photos: &[&str]) -> PlaceDetailsPage {
    PlaceDetailsPage {
        status: ApiStatus::Ok,
        reviews: Some((0..reviews).map(review).collect()),
        photos: if photos.is_empty() {
            None
        } else {
            Some(photos.iter().map(|r| photo_ref(r)).collect())
        },
        error_message: None,
    }
}

pub fn details_without_reviews() -> PlaceDetailsPage {
    PlaceDetailsPage {
        status: ApiStatus::Ok,
        reviews: None,
        photos: Some(vec![photo_ref("unused")]),
        error_message: None,
    }
}

pub fn details_error(status: ApiStatus, message: &str) -> PlaceDetailsPage {
    PlaceDetailsPage {
        status,
        reviews: None,
        photos: None,
        error_message: Some(message.to_string()),
    }
}

/// Drain every event currently queued
pub fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<WorkerEvent>) -> Vec<WorkerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn messages(events: &[WorkerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Message(m) => Some(m.clone()),
            _ => None,
        })
        .collect()
}

pub fn errors(events: &[WorkerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Error(m) => Some(m.clone()),
            _ => None,
        })
        .collect()
}

pub fn progress_values(events: &[WorkerEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}
