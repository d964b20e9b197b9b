//! File-backed quota ledger
//!
//! Stores the counters as `KEY=VALUE` lines:
//!
//! ```text
//! NEARBY=3
//! REVIEWS=57
//! PHOTOS=120
//! LASTDATE=10
//! ```
//!
//! `LASTDATE` is the month number the counters belong to.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{current_month, ApiCategory, QuotaCounters, QuotaError, QuotaLedger};
use crate::kv::KvRecords;

const LAST_DATE_KEY: &str = "LASTDATE";

/// Ledger persisted to a single file
#[derive(Debug, Clone)]
pub struct FileQuotaLedger {
    path: PathBuf,
}

impl FileQuotaLedger {
    /// Create a ledger backed by `path`. The file is created on first save.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_counter(records: &KvRecords, key: &str) -> Result<u64, QuotaError> {
        match records.get(key) {
            None => Ok(0),
            Some(raw) => raw.trim().parse().map_err(|_| QuotaError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    fn to_records(counters: &QuotaCounters) -> KvRecords {
        let mut records = KvRecords::new();
        records.set(
            ApiCategory::NearbySearch.ledger_key(),
            counters.nearby_search_calls.to_string(),
        );
        records.set(
            ApiCategory::PlaceDetails.ledger_key(),
            counters.place_details_calls.to_string(),
        );
        records.set(
            ApiCategory::PlacePhoto.ledger_key(),
            counters.place_photo_calls.to_string(),
        );
        records.set(LAST_DATE_KEY, counters.last_reset_month.to_string());
        records
    }
}

impl QuotaLedger for FileQuotaLedger {
    fn load(&self) -> Result<QuotaCounters, QuotaError> {
        let records = match KvRecords::load(&self.path)? {
            Some(records) => records,
            None => {
                debug!(path = %self.path.display(), "No quota ledger yet, starting from zero");
                return Ok(QuotaCounters::zero(current_month()));
            }
        };

        // A ledger without LASTDATE predates month tracking; treat it as stale.
        let last_reset_month = match records.get(LAST_DATE_KEY) {
            Some(raw) => raw.trim().parse().map_err(|_| QuotaError::InvalidValue {
                key: LAST_DATE_KEY.to_string(),
                value: raw.to_string(),
            })?,
            None => 0,
        };

        let counters = QuotaCounters {
            nearby_search_calls: Self::parse_counter(&records, ApiCategory::NearbySearch.ledger_key())?,
            place_details_calls: Self::parse_counter(&records, ApiCategory::PlaceDetails.ledger_key())?,
            place_photo_calls: Self::parse_counter(&records, ApiCategory::PlacePhoto.ledger_key())?,
            last_reset_month,
        };

        if last_reset_month != 0 {
            counters.validate()?;
        }
        Ok(counters)
    }

    fn save(&self, counters: &QuotaCounters) -> Result<(), QuotaError> {
        counters.validate()?;
        Self::to_records(counters).save(&self.path)?;
        info!(
            path = %self.path.display(),
            nearby = counters.nearby_search_calls,
            reviews = counters.place_details_calls,
            photos = counters.place_photo_calls,
            month = counters.last_reset_month,
            "Quota ledger saved"
        );
        Ok(())
    }
}
