//! Progress band arithmetic.
//!
//! A run reports progress on a fixed 0-100 scale split into three bands:
//! search up to [`METADATA_PROGRESS`], enrichment up to
//! `PROGRESS_TOTAL - IMAGE_PROGRESS`, and photo download for the rest.

use crate::downloader::config::{IMAGE_PROGRESS, METADATA_PROGRESS, PROGRESS_TOTAL};

/// Progress after `done` of `total` candidates have been enriched.
pub fn enrichment_progress(done: usize, total: usize) -> u8 {
    let band = PROGRESS_TOTAL - METADATA_PROGRESS - IMAGE_PROGRESS;
    METADATA_PROGRESS + scaled(band, done, total)
}

/// Progress after `done` of `total` photos have been fetched.
pub fn photo_progress(done: usize, total: usize) -> u8 {
    (PROGRESS_TOTAL - IMAGE_PROGRESS) + scaled(IMAGE_PROGRESS, done, total)
}

/// `band * done / total`, truncated; a zero total counts as complete.
fn scaled(band: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return band;
    }
    let done = done.min(total) as u64;
    let value = u64::from(band) * done / total as u64;
    // value <= band because done <= total
    value as u8
}
