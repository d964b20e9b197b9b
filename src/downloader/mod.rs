//! Download orchestration
//!
//! A run executes four stages in strict sequence on a single task:
//!
//! 1. **Search**: paginated nearby search via [`crate::fetcher::PaginationHelper`]
//! 2. **Enrichment**: reviews and photo references via [`enrich::PlaceEnricher`]
//! 3. **Export**: the two-sheet workbook via [`crate::output::export_workbook`]
//! 4. **Photos**: optional photo download via [`photos::PhotoFetcher`]
//!
//! The observer receives [`events::WorkerEvent`]s over an unbounded channel and
//! may request cancellation at any time through the worker's
//! [`crate::shutdown::ShutdownCoordinator`].
//!
//! # Quick Start
//!
//! ```no_run
//! use places_downloader::downloader::{DownloadJob, DownloadWorker, WorkerEvent};
//! use places_downloader::fetcher::create_places_api;
//! use places_downloader::quota::FileQuotaLedger;
//! use places_downloader::LatLng;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let job = DownloadJob::new(LatLng::new(12.97, 77.59), 2, 20, "key", "cafe", "out.xlsx", "photos", false);
//! let api = create_places_api(&job.api_key);
//! let mut handle = DownloadWorker::new(job, api, Arc::new(FileQuotaLedger::new("usage.dat"))).spawn();
//!
//! while let Some(event) = handle.events.recv().await {
//!     if let WorkerEvent::Progress(p) = event {
//!         println!("{p}%");
//!     }
//! }
//! let result = handle.join().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`executor`] - The worker and its spawned handle
//! - [`job`] - Run configuration, input validation and results
//! - [`events`] - Observer notifications
//! - [`enrich`] - Place details lookup
//! - [`photos`] - Photo download
//! - [`progress`] - Progress band arithmetic
//! - [`config`] - Constants and backoff calculation

pub mod config;
pub mod enrich;
pub mod events;
pub mod executor;
pub mod job;
pub mod photos;
pub mod progress;

pub use events::{EventSink, WorkerEvent};
pub use executor::{DownloadWorker, WorkerHandle};
pub use job::{DownloadJob, RawInputs, RunResult, RunStatus, ValidationErrors};

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] crate::fetcher::FetcherError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] crate::output::OutputError),

    /// Quota ledger error
    #[error("quota error: {0}")]
    QuotaError(#[from] crate::quota::QuotaError),

    /// Validation error
    #[error("validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    /// Worker task panicked or was aborted
    #[error("worker task failed: {0}")]
    TaskError(String),
}
