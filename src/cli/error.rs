//! CLI error types and conversions

use crate::downloader::{DownloadError, ValidationErrors};
use crate::prefs::PrefsError;
use crate::quota::QuotaError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Download error
    #[error("download error: {0}")]
    DownloadError(#[from] DownloadError),

    /// Rejected inputs
    #[error("invalid input: {0}")]
    ValidationError(#[from] ValidationErrors),

    /// Preferences error
    #[error("preferences error: {0}")]
    PrefsError(#[from] PrefsError),

    /// Quota ledger error
    #[error("quota error: {0}")]
    QuotaError(#[from] QuotaError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// The run ended without results
    #[error("run failed: {0}")]
    RunFailed(String),
}
