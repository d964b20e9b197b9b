//! Download job structures and status tracking

use crate::{EnrichedPlace, LatLng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Largest accepted search radius in kilometers
pub const MAX_RADIUS_KM: u32 = 50;

/// Immutable configuration of one download run
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadJob {
    /// Search center
    pub center: LatLng,
    /// Search radius in kilometers (0-50)
    pub radius_km: u32,
    /// Maximum number of search results to enrich
    pub result_limit: usize,
    /// Places API key
    pub api_key: String,
    /// Search keyword; carried for the record but not sent with the search
    pub keyword: String,
    /// Workbook output path
    pub xlsx_path: PathBuf,
    /// Directory photos are written to
    pub output_dir: PathBuf,
    /// Whether photos are downloaded
    pub save_images: bool,
}

impl fmt::Debug for DownloadJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadJob")
            .field("center", &self.center)
            .field("radius_km", &self.radius_km)
            .field("result_limit", &self.result_limit)
            .field("api_key", &"<redacted>")
            .field("keyword", &self.keyword)
            .field("xlsx_path", &self.xlsx_path)
            .field("output_dir", &self.output_dir)
            .field("save_images", &self.save_images)
            .finish()
    }
}

impl DownloadJob {
    /// Create a new download job
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        center: LatLng,
        radius_km: u32,
        result_limit: usize,
        api_key: impl Into<String>,
        keyword: impl Into<String>,
        xlsx_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        save_images: bool,
    ) -> Self {
        Self {
            center,
            radius_km,
            result_limit,
            api_key: api_key.into(),
            keyword: keyword.into(),
            xlsx_path: xlsx_path.into(),
            output_dir: output_dir.into(),
            save_images,
        }
    }

    /// Search radius in meters as sent to the API
    pub fn radius_meters(&self) -> u32 {
        self.radius_km.saturating_mul(1000)
    }

    /// Validate job parameters, collecting every violation
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if !(-90.0..=90.0).contains(&self.center.lat) {
            errors.push("latitude", "latitude must lie between -90 and 90 degrees");
        }
        if !(-180.0..=180.0).contains(&self.center.lng) {
            errors.push("longitude", "longitude must lie between -180 and 180 degrees");
        }
        if self.radius_km > MAX_RADIUS_KM {
            errors.push("radius", format!("radius must lie between 0 and {MAX_RADIUS_KM} kms"));
        }
        check_required(&mut errors, "api_key", &self.api_key, "places api key needs to be specified");
        check_required(&mut errors, "keyword", &self.keyword, "keyword needs to be specified");
        check_required(
            &mut errors,
            "xlsx_path",
            &self.xlsx_path.to_string_lossy(),
            "xlsx file path needs to be specified",
        );
        check_required(
            &mut errors,
            "output_dir",
            &self.output_dir.to_string_lossy(),
            "output directory needs to be specified",
        );

        errors.into_result(())
    }

    /// Parse and validate raw user input
    ///
    /// A field that does not parse is reported once and skipped by the range
    /// checks; every other violation is reported alongside it.
    pub fn from_inputs(inputs: &RawInputs) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let lat = parse_number::<f64>(&mut errors, "latitude", &inputs.latitude);
        let lng = parse_number::<f64>(&mut errors, "longitude", &inputs.longitude);
        let radius = parse_number::<f64>(&mut errors, "radius", &inputs.radius);
        let limit = parse_number::<f64>(&mut errors, "limit", &inputs.limit);

        if let Some(lat) = lat {
            if !(-90.0..=90.0).contains(&lat) {
                errors.push("latitude", "latitude must lie between -90 and 90 degrees");
            }
        }
        if let Some(lng) = lng {
            if !(-180.0..=180.0).contains(&lng) {
                errors.push("longitude", "longitude must lie between -180 and 180 degrees");
            }
        }
        let radius_km = radius.and_then(|r| {
            if (0.0..=f64::from(MAX_RADIUS_KM)).contains(&r) {
                if r.fract() == 0.0 {
                    Some(r as u32)
                } else {
                    errors.push("radius", "radius must be a whole number of kms");
                    None
                }
            } else {
                errors.push("radius", format!("radius must lie between 0 and {MAX_RADIUS_KM} kms"));
                None
            }
        });
        let result_limit = limit.and_then(|l| {
            if l < 0.0 {
                errors.push("limit", "entry limit cannot be negative");
                None
            } else if l.fract() != 0.0 {
                errors.push("limit", "entry limit must be a whole number");
                None
            } else {
                Some(l as usize)
            }
        });

        check_required(&mut errors, "api_key", &inputs.api_key, "places api key needs to be specified");
        check_required(&mut errors, "keyword", &inputs.keyword, "keyword needs to be specified");
        check_required(&mut errors, "xlsx_path", &inputs.xlsx_path, "xlsx file path needs to be specified");
        check_required(
            &mut errors,
            "output_dir",
            &inputs.output_dir,
            "output directory needs to be specified",
        );

        match (lat, lng, radius_km, result_limit) {
            (Some(lat), Some(lng), Some(radius_km), Some(result_limit)) if errors.is_empty() => {
                Ok(Self::new(
                    LatLng::new(lat, lng),
                    radius_km,
                    result_limit,
                    inputs.api_key.trim(),
                    inputs.keyword.trim(),
                    inputs.xlsx_path.trim(),
                    inputs.output_dir.trim(),
                    inputs.save_images,
                ))
            }
            _ => Err(errors),
        }
    }
}

fn parse_number<T: std::str::FromStr>(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> Option<T> {
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(field, format!("{} is not numeric", field_label(field)));
            None
        }
    }
}

fn check_required(errors: &mut ValidationErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(field, message);
    }
}

fn field_label(field: &str) -> &str {
    match field {
        "limit" => "limit entries",
        other => other,
    }
}

/// Unparsed user input, as typed on the command line or stored in preferences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInputs {
    /// Places API key
    pub api_key: String,
    /// Workbook output path
    pub xlsx_path: String,
    /// Photo output directory
    pub output_dir: String,
    /// Latitude in degrees
    pub latitude: String,
    /// Longitude in degrees
    pub longitude: String,
    /// Radius in kilometers
    pub radius: String,
    /// Search keyword
    pub keyword: String,
    /// Result limit
    pub limit: String,
    /// Whether photos are downloaded
    pub save_images: bool,
}

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name
    pub field: &'static str,
    /// Human readable reason
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Every problem found while validating input
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_errors(.errors))]
pub struct ValidationErrors {
    /// Errors in the order they were found
    pub errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Record an error for `field`
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether no errors were recorded
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Names of the rejected fields, in order
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    /// `Ok(value)` when empty, otherwise `Err(self)`
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RunStatus {
    /// Not started
    #[default]
    Idle,
    /// Pipeline executing
    Running,
    /// Pipeline finished
    Completed,
    /// Stopped on request
    Halted,
    /// Nothing usable was produced
    Failed,
}

impl RunStatus {
    /// Whether the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Halted | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Halted => "halted",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Final outcome handed back to the caller
///
/// `places` is empty whenever `status` is not [`RunStatus::Completed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Terminal status
    pub status: RunStatus,
    /// Enriched places in search order
    pub places: Vec<EnrichedPlace>,
}

impl RunResult {
    /// Successful result carrying `places`
    pub fn completed(places: Vec<EnrichedPlace>) -> Self {
        Self {
            status: RunStatus::Completed,
            places,
        }
    }

    /// Cancelled run
    pub fn halted() -> Self {
        Self {
            status: RunStatus::Halted,
            places: Vec::new(),
        }
    }

    /// Failed run
    pub fn failed() -> Self {
        Self {
            status: RunStatus::Failed,
            places: Vec::new(),
        }
    }
}
