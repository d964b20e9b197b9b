//! Saved user inputs.
//!
//! The last inputs of a run can be stored so the next run only needs to name
//! what changed. The file uses the same `KEY=VALUE` format as the quota
//! ledger; flags are stored as `true`/`false`.

use std::path::Path;
use tracing::debug;

use crate::downloader::RawInputs;
use crate::kv::{KvError, KvRecords};

const API_KEY: &str = "GAPI_KEY";
const XLSX_PATH: &str = "XLSX_FILE_PATH";
const OUTPUT_DIR: &str = "OUTPUT_DIR_NAME";
const LATITUDE: &str = "LATITUDE";
const LONGITUDE: &str = "LONGITUDE";
const RADIUS: &str = "RADIUS";
const KEYWORD: &str = "KEYWORD";
const SAVE_LOG: &str = "SAVE_LOG";
const SAVE_IMAGES: &str = "SAVE_IMAGES";
const LIMIT: &str = "LIMIT_ENTRIES";

/// Preference file errors
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    /// Underlying file error
    #[error("preferences file error: {0}")]
    FileError(#[from] KvError),

    /// A flag that is neither `true` nor `false`
    #[error("invalid flag for {key}: {value:?}")]
    InvalidFlag {
        /// Record key
        key: String,
        /// Raw value
        value: String,
    },
}

/// Stored inputs; absent entries are `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    /// Places API key
    pub api_key: Option<String>,
    /// Workbook output path
    pub xlsx_path: Option<String>,
    /// Photo output directory
    pub output_dir: Option<String>,
    /// Latitude, unparsed
    pub latitude: Option<String>,
    /// Longitude, unparsed
    pub longitude: Option<String>,
    /// Radius in kilometers, unparsed
    pub radius: Option<String>,
    /// Search keyword
    pub keyword: Option<String>,
    /// Result limit, unparsed
    pub limit: Option<String>,
    /// Whether the message log is saved
    pub save_log: Option<bool>,
    /// Whether photos are downloaded
    pub save_images: Option<bool>,
}

impl Preferences {
    /// Load preferences; a missing file yields empty preferences
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        match KvRecords::load(path)? {
            Some(records) => Self::from_records(&records),
            None => Ok(Self::default()),
        }
    }

    /// Persist preferences
    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        self.to_records().save(path)?;
        debug!(path = %path.display(), "Preferences saved");
        Ok(())
    }

    /// Read preferences from records; unknown keys are ignored
    pub fn from_records(records: &KvRecords) -> Result<Self, PrefsError> {
        let text = |key: &str| records.get(key).map(str::to_string);
        Ok(Self {
            api_key: text(API_KEY),
            xlsx_path: text(XLSX_PATH),
            output_dir: text(OUTPUT_DIR),
            latitude: text(LATITUDE),
            longitude: text(LONGITUDE),
            radius: text(RADIUS),
            keyword: text(KEYWORD),
            limit: text(LIMIT),
            save_log: parse_flag(records, SAVE_LOG)?,
            save_images: parse_flag(records, SAVE_IMAGES)?,
        })
    }

    /// Records for the present entries, in a fixed key order
    pub fn to_records(&self) -> KvRecords {
        let mut records = KvRecords::new();
        let texts = [
            (API_KEY, &self.api_key),
            (XLSX_PATH, &self.xlsx_path),
            (OUTPUT_DIR, &self.output_dir),
            (LATITUDE, &self.latitude),
            (LONGITUDE, &self.longitude),
            (RADIUS, &self.radius),
            (KEYWORD, &self.keyword),
        ];
        for (key, value) in texts {
            if let Some(value) = value {
                records.set(key, value.as_str());
            }
        }
        for (key, flag) in [(SAVE_LOG, self.save_log), (SAVE_IMAGES, self.save_images)] {
            if let Some(flag) = flag {
                records.set(key, flag.to_string());
            }
        }
        if let Some(limit) = &self.limit {
            records.set(LIMIT, limit.as_str());
        }
        records
    }

    /// Preferences capturing a run's inputs
    pub fn from_inputs(inputs: &RawInputs, save_log: bool) -> Self {
        Self {
            api_key: Some(inputs.api_key.clone()),
            xlsx_path: Some(inputs.xlsx_path.clone()),
            output_dir: Some(inputs.output_dir.clone()),
            latitude: Some(inputs.latitude.clone()),
            longitude: Some(inputs.longitude.clone()),
            radius: Some(inputs.radius.clone()),
            keyword: Some(inputs.keyword.clone()),
            limit: Some(inputs.limit.clone()),
            save_log: Some(save_log),
            save_images: Some(inputs.save_images),
        }
    }
}

fn parse_flag(records: &KvRecords, key: &str) -> Result<Option<bool>, PrefsError> {
    match records.get(key).map(str::trim) {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(v) => Err(PrefsError::InvalidFlag {
            key: key.to_string(),
            value: v.to_string(),
        }),
    }
}
