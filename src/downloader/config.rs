//! Download configuration constants

use std::time::Duration;

/// Maximum number of retries for a failed HTTP request.
/// Covers transport errors, HTTP 429 and 5xx; API status errors are never retried.
pub const MAX_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 30000; // 30 seconds

/// Delay before a freshly issued page token becomes valid.
/// Requesting the next page sooner fails with INVALID_REQUEST.
pub const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(5);

/// Size of the slices photo bodies are written in.
pub const CHUNK_SIZE: usize = 4096;

/// Progress value once the search phase is done (0-10% is the search band).
pub const METADATA_PROGRESS: u8 = 10;

/// Width of the photo band at the end of the progress range (70-100%).
pub const IMAGE_PROGRESS: u8 = 30;

/// Progress total announced at the start of every run.
pub const PROGRESS_TOTAL: u8 = 100;

/// Calculate exponential backoff delay
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry_count));
    let delay_ms = delay_ms.min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}
