//! Photo download
//!
//! Photos are streamed to `{output_dir}/{place_id}_{n}.jpg`. A failed photo
//! is reported and skipped; the remaining photos are still fetched.

use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::downloader::config::CHUNK_SIZE;
use crate::downloader::events::EventSink;
use crate::downloader::progress::photo_progress;
use crate::fetcher::{FetcherError, PhotoStream, PlacesApi};
use crate::quota::{ApiCategory, ApiUsage};
use crate::shutdown::ShutdownCoordinator;
use crate::{EnrichedPlace, PhotoRef};

/// Why a single photo was not saved
#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    /// Request failed or the body stream broke off
    #[error("download failed: {0}")]
    Download(#[from] FetcherError),

    /// Local file could not be written
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// File name of the `index`-th (1-based) photo of a place
pub fn photo_file_name(place_id: &str, index: usize) -> String {
    format!("{place_id}_{index}.jpg")
}

/// Streams place photos to a directory
pub struct PhotoFetcher<'a> {
    api: &'a dyn PlacesApi,
    output_dir: PathBuf,
}

impl<'a> PhotoFetcher<'a> {
    /// Create a fetcher writing into `output_dir`
    pub fn new(api: &'a dyn PlacesApi, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            output_dir: output_dir.into(),
        }
    }

    /// Directory photos are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetch every photo of every place
    ///
    /// Progress runs through the photo band as photos complete. Returns
    /// `false` if a cancellation request stopped the download.
    pub async fn fetch_all(
        &self,
        places: &[EnrichedPlace],
        shutdown: &ShutdownCoordinator,
        usage: &mut ApiUsage,
        events: &mut EventSink,
    ) -> bool {
        let total: usize = places.iter().map(|p| p.photos.len()).sum();
        let mut done = 0usize;

        if total > 0 {
            if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
                warn!(dir = %self.output_dir.display(), error = %e, "Failed to create output directory");
            }
        }

        for place in places {
            let completed = self
                .fetch_photos(place.place_id(), &place.photos, shutdown, usage, events, &mut done, total)
                .await;
            if !completed {
                return false;
            }
        }

        events.progress(photo_progress(done, total));
        true
    }

    /// Fetch the photos of one place
    #[allow(clippy::too_many_arguments)]
    async fn fetch_photos(
        &self,
        place_id: &str,
        photos: &[PhotoRef],
        shutdown: &ShutdownCoordinator,
        usage: &mut ApiUsage,
        events: &mut EventSink,
        done: &mut usize,
        total: usize,
    ) -> bool {
        for (i, photo) in photos.iter().enumerate() {
            if shutdown.is_shutdown_requested() {
                debug!(place_id, completed = *done, total, "Photo download cancelled");
                return false;
            }

            let filename = photo_file_name(place_id, i + 1);
            match self.fetch_one(&filename, photo, usage).await {
                Ok(bytes) => {
                    debug!(file = %filename, bytes, "Photo saved");
                    events.message(format!("saved file {filename}"));
                }
                Err(PhotoError::Download(e)) => {
                    debug!(file = %filename, error = %e, "Photo download failed");
                    events.message(format!("could not download file {filename}"));
                }
                Err(PhotoError::Write(e)) => {
                    debug!(file = %filename, error = %e, "Photo write failed");
                    events.message(format!("could not write file {filename}"));
                }
            }

            *done += 1;
            events.progress(photo_progress(*done, total));
        }
        true
    }

    /// Download one photo into `filename`, returning the bytes written
    pub async fn fetch_one(
        &self,
        filename: &str,
        photo: &PhotoRef,
        usage: &mut ApiUsage,
    ) -> Result<u64, PhotoError> {
        let result = self.api.place_photo(photo).await;
        usage.record(ApiCategory::PlacePhoto);
        let stream = result?;

        let path = self.output_dir.join(filename);
        match write_stream(&path, stream).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                // Do not leave a truncated image behind.
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %path.display(), error = %remove_err, "Failed to remove partial photo");
                    }
                }
                Err(e)
            }
        }
    }
}

/// Write `stream` to `path` in [`CHUNK_SIZE`] slices
async fn write_stream(path: &Path, mut stream: PhotoStream) -> Result<u64, PhotoError> {
    let mut file = File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for slice in chunk.chunks(CHUNK_SIZE) {
            file.write_all(slice).await?;
            written += slice.len() as u64;
        }
    }

    file.flush().await?;
    Ok(written)
}
