//! Report output
//!
//! The run's enriched places are exported to an xlsx workbook with two sheets
//! sharing one header:
//! - [`FORMATTED_SHEET`]: one block per place, place columns merged across
//!   the block's review rows
//! - [`UNFORMATTED_SHEET`]: one flat row per review

use chrono::DateTime;

pub mod xlsx;

pub use xlsx::{build_workbook, export_workbook, PlaceBlock};

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Workbook assembly or serialization error
    #[error("xlsx error: {0}")]
    XlsxError(String),

    /// Review time outside the representable range
    #[error("invalid review timestamp: {0}")]
    InvalidTimestamp(i64),
}

impl From<rust_xlsxwriter::XlsxError> for OutputError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::XlsxError(e.to_string())
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Name of the merged, human readable sheet
pub const FORMATTED_SHEET: &str = "reviews-formatted";

/// Name of the one-row-per-review sheet
pub const UNFORMATTED_SHEET: &str = "reviews-unformatted";

/// Header row shared by both sheets
pub const HEADER: [&str; 9] = [
    "No.", "lat", "long", "name", "place_id", "types", "author", "comment", "timestamp",
];

/// Column widths, indexed like [`HEADER`] (columns A through I)
pub const COLUMN_WIDTHS: [f64; 9] = [2.0, 15.0, 15.0, 25.0, 30.0, 30.0, 25.0, 100.0, 30.0];

/// Number of leading columns that describe the place rather than the review
pub const PLACE_COLUMNS: u16 = 6;

/// Render a review time as e.g. `Monday, 01 January, 2024` (UTC)
pub fn format_review_timestamp(unix_timestamp: i64) -> OutputResult<String> {
    DateTime::from_timestamp(unix_timestamp, 0)
        .map(|dt| dt.format("%A, %d %B, %Y").to_string())
        .ok_or(OutputError::InvalidTimestamp(unix_timestamp))
}

/// What an export wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Places that produced at least one row
    pub places: usize,
    /// Data rows on the formatted sheet
    pub formatted_rows: usize,
    /// Data rows on the unformatted sheet
    pub unformatted_rows: usize,
    /// Places whose columns were merged (two or more reviews)
    pub merged_blocks: usize,
}
