//! API usage tracking
//!
//! Every call to the Places API is billed, so each run counts its calls per
//! category ([`ApiUsage`]) and adds them to a persisted monthly tally
//! ([`QuotaCounters`]) kept by a [`QuotaLedger`].

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

use crate::kv::KvError;

pub mod ledger;

pub use ledger::FileQuotaLedger;

/// Quota ledger errors
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// Underlying file error
    #[error("ledger file error: {0}")]
    FileError(#[from] KvError),

    /// A counter that is not a number
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Record key
        key: String,
        /// Raw value
        value: String,
    },

    /// Month outside 1..=12
    #[error("invalid month: {0}")]
    InvalidMonth(u32),
}

/// API call category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiCategory {
    /// Nearby search calls
    NearbySearch,
    /// Place details calls
    PlaceDetails,
    /// Place photo calls
    PlacePhoto,
}

impl ApiCategory {
    /// Key used in the ledger file
    pub fn ledger_key(&self) -> &'static str {
        match self {
            Self::NearbySearch => "NEARBY",
            Self::PlaceDetails => "REVIEWS",
            Self::PlacePhoto => "PHOTOS",
        }
    }
}

impl std::fmt::Display for ApiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NearbySearch => "nearby search",
            Self::PlaceDetails => "place details",
            Self::PlacePhoto => "place photo",
        };
        write!(f, "{s}")
    }
}

/// Calls made during one run
///
/// Counts logical API calls: a request the HTTP client retried after a
/// network error, HTTP 429 or 5xx still counts once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUsage {
    /// Nearby search calls
    pub nearby_search_calls: u64,
    /// Place details calls
    pub place_details_calls: u64,
    /// Place photo calls
    pub place_photo_calls: u64,
}

impl ApiUsage {
    /// Count one call in `category`
    pub fn record(&mut self, category: ApiCategory) {
        match category {
            ApiCategory::NearbySearch => self.nearby_search_calls += 1,
            ApiCategory::PlaceDetails => self.place_details_calls += 1,
            ApiCategory::PlacePhoto => self.place_photo_calls += 1,
        }
    }

    /// Calls counted for `category`
    pub fn get(&self, category: ApiCategory) -> u64 {
        match category {
            ApiCategory::NearbySearch => self.nearby_search_calls,
            ApiCategory::PlaceDetails => self.place_details_calls,
            ApiCategory::PlacePhoto => self.place_photo_calls,
        }
    }

    /// Sum over all categories
    pub fn total(&self) -> u64 {
        self.nearby_search_calls + self.place_details_calls + self.place_photo_calls
    }
}

/// Persisted monthly call counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaCounters {
    /// Nearby search calls this month
    pub nearby_search_calls: u64,
    /// Place details calls this month
    pub place_details_calls: u64,
    /// Place photo calls this month
    pub place_photo_calls: u64,
    /// Month (1-12) the counters belong to
    pub last_reset_month: u32,
}

impl QuotaCounters {
    /// Zero counters for `month`
    pub fn zero(month: u32) -> Self {
        Self {
            nearby_search_calls: 0,
            place_details_calls: 0,
            place_photo_calls: 0,
            last_reset_month: month,
        }
    }

    /// Add a run's usage, resetting first when the stored month is stale.
    ///
    /// The returned counters always carry `current_month`.
    pub fn accumulate(&self, usage: &ApiUsage, current_month: u32) -> Self {
        let base = if self.last_reset_month == current_month {
            *self
        } else {
            Self::zero(current_month)
        };

        Self {
            nearby_search_calls: base.nearby_search_calls + usage.nearby_search_calls,
            place_details_calls: base.place_details_calls + usage.place_details_calls,
            place_photo_calls: base.place_photo_calls + usage.place_photo_calls,
            last_reset_month: current_month,
        }
    }

    /// Validate the month field
    pub fn validate(&self) -> Result<(), QuotaError> {
        if !(1..=12).contains(&self.last_reset_month) {
            return Err(QuotaError::InvalidMonth(self.last_reset_month));
        }
        Ok(())
    }
}

/// Storage for the monthly counters
///
/// Counters hold logical calls as recorded in [`ApiUsage`], not HTTP
/// attempts, so transport retries are not reflected.
pub trait QuotaLedger: Send + Sync {
    /// Stored counters, zero-valued for the current month if nothing is stored
    fn load(&self) -> Result<QuotaCounters, QuotaError>;

    /// Replace the stored counters
    fn save(&self, counters: &QuotaCounters) -> Result<(), QuotaError>;

    /// Fold a run's usage into the stored counters and persist the result
    fn record(&self, usage: &ApiUsage, current_month: u32) -> Result<QuotaCounters, QuotaError> {
        let updated = self.load()?.accumulate(usage, current_month);
        self.save(&updated)?;
        Ok(updated)
    }
}

/// Current local calendar month (1-12)
pub fn current_month() -> u32 {
    Local::now().month()
}
