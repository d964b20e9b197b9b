//! Download worker
//!
//! Runs search, enrichment, export and photo download in sequence and always
//! finishes by recording API usage, emitting the usage report and emitting
//! the final result, whatever path the run took.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::downloader::config::{METADATA_PROGRESS, PAGE_TOKEN_DELAY, PROGRESS_TOTAL};
use crate::downloader::enrich::PlaceEnricher;
use crate::downloader::events::{EventSink, WorkerEvent};
use crate::downloader::job::{DownloadJob, RunResult, RunStatus};
use crate::downloader::photos::PhotoFetcher;
use crate::downloader::DownloadError;
use crate::fetcher::{PaginationHelper, PlacesApi};
use crate::output::{export_workbook, ExportSummary, OutputError, OutputResult};
use crate::quota::{current_month, ApiUsage, QuotaLedger};
use crate::shutdown::{self, SharedShutdown, ShutdownCoordinator};
use crate::EnrichedPlace;

/// Orchestrates one download run
pub struct DownloadWorker {
    job: DownloadJob,
    api: Arc<dyn PlacesApi>,
    ledger: Arc<dyn QuotaLedger>,
    shutdown: SharedShutdown,
    page_token_delay: Duration,
    status: RunStatus,
}

impl DownloadWorker {
    /// Create a worker for `job`
    ///
    /// Uses the globally registered shutdown handle when there is one.
    pub fn new(job: DownloadJob, api: Arc<dyn PlacesApi>, ledger: Arc<dyn QuotaLedger>) -> Self {
        Self {
            job,
            api,
            ledger,
            shutdown: shutdown::get_global_shutdown().unwrap_or_else(ShutdownCoordinator::shared),
            page_token_delay: PAGE_TOKEN_DELAY,
            status: RunStatus::Idle,
        }
    }

    /// Attach a shared shutdown handle for cooperative cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Override the wait before requesting a page by token.
    pub fn with_page_token_delay(mut self, delay: Duration) -> Self {
        self.page_token_delay = delay;
        self
    }

    /// The job this worker runs
    pub fn job(&self) -> &DownloadJob {
        &self.job
    }

    /// Current state
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Handle that can stop this worker
    pub fn shutdown_handle(&self) -> SharedShutdown {
        Arc::clone(&self.shutdown)
    }

    /// Request cooperative cancellation
    pub fn stop(&self) {
        self.shutdown.request_shutdown();
    }

    /// Run the worker on its own task
    pub fn spawn(mut self) -> WorkerHandle {
        let (mut sink, events) = EventSink::channel();
        let shutdown = self.shutdown_handle();
        let task = tokio::spawn(async move { self.run(&mut sink).await });

        WorkerHandle {
            events,
            shutdown,
            task,
        }
    }

    /// Execute the run, reporting to `events`
    ///
    /// The returned result is also sent as the final [`WorkerEvent::Finished`].
    pub async fn run(&mut self, events: &mut EventSink) -> RunResult {
        if self.status.is_terminal() || self.status == RunStatus::Running {
            warn!(status = %self.status, "Worker already used, ignoring run request");
            return RunResult::failed();
        }

        self.status = RunStatus::Running;
        info!(
            lat = self.job.center.lat,
            lng = self.job.center.lng,
            radius_km = self.job.radius_km,
            limit = self.job.result_limit,
            save_images = self.job.save_images,
            "Starting download run"
        );

        match self.ledger.load() {
            Ok(stored) => debug!(?stored, "Loaded quota counters"),
            Err(e) => warn!(error = %e, "Failed to load quota counters"),
        }

        let mut usage = ApiUsage::default();
        events.total(PROGRESS_TOTAL);
        let result = self.execute(&mut usage, events).await;
        self.finalize(usage, result, events)
    }

    async fn execute(&self, usage: &mut ApiUsage, events: &mut EventSink) -> RunResult {
        let job = &self.job;

        events.message("searching for nearby places...");
        let outcome = PaginationHelper::paginate_nearby_search(
            self.api.as_ref(),
            job.center,
            job.radius_meters(),
            job.result_limit,
            self.page_token_delay,
            &self.shutdown,
            usage,
        )
        .await;

        if let Some(e) = &outcome.failure {
            events.error(format!("Error fetching nearby places. {}", e.user_message()));
        }
        events.progress(METADATA_PROGRESS);

        if self.cancelled() {
            return RunResult::halted();
        }

        if outcome.candidates.is_empty() {
            events.message("No places fetched. Aborting...");
            return RunResult::failed();
        }
        events.message(format!("{} places found", outcome.candidates.len()));

        let enricher = PlaceEnricher::new(self.api.as_ref());
        let Some(places) = enricher
            .enrich_all(outcome.candidates, &self.shutdown, usage, events)
            .await
        else {
            return RunResult::halted();
        };

        if self.cancelled() {
            return RunResult::halted();
        }

        events.message(format!("flushing {} places to excel workbook...", places.len()));
        match self.export(&places).await {
            Ok(Some(summary)) => {
                debug!(?summary, "Export finished");
                events.message("saved data to excel file");
            }
            Ok(None) => return RunResult::halted(),
            Err(e) => {
                error!(error = %e, "Export failed");
                events.error(format!("Error writing to excel file. {e}"));
            }
        }

        if self.cancelled() {
            return RunResult::halted();
        }

        if job.save_images {
            let count: usize = places.iter().map(|p| p.photos.len()).sum();
            events.message(format!("downloading {count} images..."));

            let fetcher = PhotoFetcher::new(self.api.as_ref(), &job.output_dir);
            if !fetcher.fetch_all(&places, &self.shutdown, usage, events).await {
                return RunResult::halted();
            }
            events.message(format!("downloaded all {count} images"));
        } else {
            events.progress(PROGRESS_TOTAL);
        }

        RunResult::completed(places)
    }

    /// Write the workbook off the async executor
    async fn export(&self, places: &[EnrichedPlace]) -> OutputResult<Option<ExportSummary>> {
        let path = self.job.xlsx_path.clone();
        let places = places.to_vec();
        let shutdown = Arc::clone(&self.shutdown);

        tokio::task::spawn_blocking(move || export_workbook(&path, &places, &shutdown))
            .await
            .map_err(|e| OutputError::IoError(format!("export task failed: {e}")))?
    }

    fn cancelled(&self) -> bool {
        self.shutdown.is_shutdown_requested()
    }

    fn finalize(&mut self, usage: ApiUsage, result: RunResult, events: &mut EventSink) -> RunResult {
        if result.status == RunStatus::Halted {
            events.message("worker halted forcefully");
        }

        let totals = match self.ledger.record(&usage, current_month()) {
            Ok(totals) => Some(totals),
            Err(e) => {
                error!(error = %e, "Failed to persist quota counters");
                events.error(format!("Error saving API usage. {e}"));
                None
            }
        };
        events.usage(usage, totals);

        self.status = result.status;
        info!(
            status = %result.status,
            places = result.places.len(),
            nearby_calls = usage.nearby_search_calls,
            details_calls = usage.place_details_calls,
            photo_calls = usage.place_photo_calls,
            "Download run finished"
        );
        events.finished(result.clone());
        result
    }
}

/// Handle to a spawned worker
pub struct WorkerHandle {
    /// Notifications from the worker, ending after [`WorkerEvent::Finished`]
    pub events: UnboundedReceiver<WorkerEvent>,
    shutdown: SharedShutdown,
    task: JoinHandle<RunResult>,
}

impl WorkerHandle {
    /// Request cooperative cancellation
    pub fn stop(&self) {
        self.shutdown.request_shutdown();
    }

    /// Shutdown handle shared with the worker
    pub fn shutdown(&self) -> SharedShutdown {
        Arc::clone(&self.shutdown)
    }

    /// Whether the worker task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end
    pub async fn join(self) -> Result<RunResult, DownloadError> {
        self.task
            .await
            .map_err(|e| DownloadError::TaskError(e.to_string()))
    }
}
