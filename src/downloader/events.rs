//! Worker notifications
//!
//! The worker reports to its observer through an unbounded channel: sends
//! never block and a dropped receiver is ignored. [`EventSink`] also mirrors
//! every message into the log and keeps progress from moving backwards.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::downloader::job::RunResult;
use crate::quota::{ApiUsage, QuotaCounters};

/// Notification emitted by a running worker
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// Progress total, always the first event of a run
    Total(u8),
    /// Progress value, non-decreasing within a run
    Progress(u8),
    /// Informational log line
    Message(String),
    /// Error the user should be warned about
    Error(String),
    /// Calls made during the run, and the stored totals once persisted
    Usage {
        /// This run's calls per category
        run: ApiUsage,
        /// Monthly totals after recording the run; `None` if saving failed
        totals: Option<QuotaCounters>,
    },
    /// Terminal result, always the last event of a run
    Finished(RunResult),
}

/// Sending half used by the worker
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<UnboundedSender<WorkerEvent>>,
    last_progress: u8,
}

impl EventSink {
    /// Create a sink and its receiving half
    pub fn channel() -> (Self, UnboundedReceiver<WorkerEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Wrap an existing sender
    pub fn new(tx: UnboundedSender<WorkerEvent>) -> Self {
        Self {
            tx: Some(tx),
            last_progress: 0,
        }
    }

    /// Sink that only logs
    pub fn detached() -> Self {
        Self {
            tx: None,
            last_progress: 0,
        }
    }

    fn send(&self, event: WorkerEvent) {
        if let Some(tx) = &self.tx {
            // Observer may have gone away; the run continues regardless.
            let _ = tx.send(event);
        }
    }

    /// Announce the progress total
    pub fn total(&mut self, total: u8) {
        self.last_progress = 0;
        self.send(WorkerEvent::Total(total));
    }

    /// Report progress; values lower than the last one are raised to it
    pub fn progress(&mut self, value: u8) {
        let value = value.max(self.last_progress);
        self.last_progress = value;
        self.send(WorkerEvent::Progress(value));
    }

    /// Last progress value sent
    pub fn last_progress(&self) -> u8 {
        self.last_progress
    }

    /// Informational message
    pub fn message(&self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text);
        self.send(WorkerEvent::Message(text));
    }

    /// User-facing error
    pub fn error(&self, text: impl Into<String>) {
        let text = text.into();
        warn!("{}", text);
        self.send(WorkerEvent::Error(text));
    }

    /// Usage report
    pub fn usage(&self, run: ApiUsage, totals: Option<QuotaCounters>) {
        self.send(WorkerEvent::Usage { run, totals });
    }

    /// Terminal result
    pub fn finished(&self, result: RunResult) {
        self.send(WorkerEvent::Finished(result));
    }
}
