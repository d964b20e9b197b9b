//! Download command implementation

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::downloader::{DownloadJob, DownloadWorker, RawInputs, RunResult, RunStatus, WorkerEvent};
use crate::fetcher::google_places::GooglePlacesFetcher;
use crate::fetcher::shared_resources::global_http_client;
use crate::fetcher::{create_places_api, PlacesApi};
use crate::prefs::Preferences;
use crate::quota::{ApiUsage, FileQuotaLedger, QuotaCounters};
use crate::shutdown::SharedShutdown;

use super::CliError;

/// Places downloader command line
#[derive(Parser, Debug)]
#[command(name = "places-downloader", version, about)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// API usage ledger file
    #[arg(long, global = true, default_value = "places_usage.dat")]
    pub usage_file: PathBuf,

    /// Saved inputs file, consulted for any input not given on the command line
    #[arg(long, global = true, default_value = "places_prefs.dat")]
    pub prefs_file: PathBuf,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search nearby places and export their reviews
    Download(DownloadArgs),

    /// Show this month's API usage
    Usage(super::UsageCommand),

    /// Check inputs without calling the API
    Validate(super::ValidateCommand),
}

/// Run inputs; omitted values fall back to the preferences file
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Places API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Workbook output path
    #[arg(long)]
    pub xlsx: Option<String>,

    /// Photo output directory
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Latitude of the search center (-90 to 90)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<String>,

    /// Longitude of the search center (-180 to 180)
    #[arg(long, allow_hyphen_values = true)]
    pub lng: Option<String>,

    /// Search radius in kilometers (0 to 50)
    #[arg(long, allow_hyphen_values = true)]
    pub radius: Option<String>,

    /// Search keyword
    #[arg(long)]
    pub keyword: Option<String>,

    /// Maximum number of places
    #[arg(long, allow_hyphen_values = true)]
    pub limit: Option<String>,

    /// Download place photos
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub save_images: Option<bool>,
}

impl InputArgs {
    /// Merge with saved preferences; command line values win
    pub fn resolve(&self, prefs: &Preferences) -> RawInputs {
        fn pick(arg: &Option<String>, saved: &Option<String>) -> String {
            arg.clone().or_else(|| saved.clone()).unwrap_or_default()
        }

        RawInputs {
            api_key: pick(&self.api_key, &prefs.api_key),
            xlsx_path: pick(&self.xlsx, &prefs.xlsx_path),
            output_dir: pick(&self.output_dir, &prefs.output_dir),
            latitude: pick(&self.lat, &prefs.latitude),
            longitude: pick(&self.lng, &prefs.longitude),
            radius: pick(&self.radius, &prefs.radius),
            keyword: pick(&self.keyword, &prefs.keyword),
            limit: pick(&self.limit, &prefs.limit),
            save_images: self.save_images.or(prefs.save_images).unwrap_or(false),
        }
    }
}

/// Load preferences, falling back to none when the file is unreadable
pub fn load_preferences(path: &Path) -> Preferences {
    match Preferences::load(path) {
        Ok(prefs) => prefs,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable preferences file");
            Preferences::default()
        }
    }
}

/// Download command arguments
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Run inputs
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Save the effective inputs to the preferences file
    #[arg(long, default_value_t = false)]
    pub remember: bool,

    /// Write the run's message log to this file
    #[arg(long)]
    pub save_log: Option<PathBuf>,

    /// Override the Places API base URL
    #[arg(long)]
    pub base_url: Option<String>,
}

impl DownloadArgs {
    /// Execute the download command
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let prefs = load_preferences(&cli.prefs_file);
        let raw = self.inputs.resolve(&prefs);

        let job = match DownloadJob::from_inputs(&raw) {
            Ok(job) => job,
            Err(errors) => {
                for error in &errors.errors {
                    eprintln!("Error: {error}");
                }
                return Err(errors.into());
            }
        };

        if self.remember {
            Preferences::from_inputs(&raw, self.save_log.is_some()).save(&cli.prefs_file)?;
            info!(path = %cli.prefs_file.display(), "Saved inputs");
        }

        let api: Arc<dyn PlacesApi> = match &self.base_url {
            Some(url) => Arc::new(GooglePlacesFetcher::with_base_url(
                global_http_client(),
                url.as_str(),
                job.api_key.as_str(),
            )),
            None => create_places_api(&job.api_key),
        };
        let ledger = Arc::new(FileQuotaLedger::new(&cli.usage_file));

        let mut handle = DownloadWorker::new(job, api, ledger)
            .with_shutdown(shutdown)
            .spawn();

        let pb = create_progress_bar();
        let mut log = Vec::new();
        let mut usage_report = None;

        while let Some(event) = handle.events.recv().await {
            match event {
                WorkerEvent::Total(total) => pb.set_length(u64::from(total)),
                WorkerEvent::Progress(value) => pb.set_position(u64::from(value)),
                WorkerEvent::Message(text) => {
                    pb.set_message(text.clone());
                    log.push(text);
                }
                WorkerEvent::Error(text) => {
                    pb.println(format!("Error: {text}"));
                    log.push(format!("Error: {text}"));
                }
                WorkerEvent::Usage { run, totals } => usage_report = Some((run, totals)),
                WorkerEvent::Finished(_) => {}
            }
        }

        let result = handle.join().await?;
        pb.finish_and_clear();

        if let Some(path) = &self.save_log {
            write_log(path, &log)?;
        }
        if let Some((run, totals)) = usage_report {
            print_usage_report(&run, totals.as_ref());
        }

        report_result(&result)
    }
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

fn write_log(path: &Path, lines: &[String]) -> Result<(), CliError> {
    let mut text = lines.join("\n");
    text.push('\n');
    std::fs::write(path, text)
        .map_err(|e| CliError::IoError(format!("Failed to write log {}: {e}", path.display())))?;
    info!(path = %path.display(), lines = lines.len(), "Saved message log");
    Ok(())
}

fn print_usage_report(run: &ApiUsage, totals: Option<&QuotaCounters>) {
    println!("API calls this run:");
    println!("  nearby search: {}", run.nearby_search_calls);
    println!("  place details: {}", run.place_details_calls);
    println!("  place photo:   {}", run.place_photo_calls);
    if let Some(totals) = totals {
        println!(
            "API calls this month: nearby search {}, place details {}, place photo {}",
            totals.nearby_search_calls, totals.place_details_calls, totals.place_photo_calls
        );
    }
}

fn report_result(result: &RunResult) -> Result<(), CliError> {
    match result.status {
        RunStatus::Completed => {
            println!("Done: {} places with reviews", result.places.len());
            Ok(())
        }
        RunStatus::Halted => {
            println!("Download halted");
            Ok(())
        }
        other => Err(CliError::RunFailed(format!("run ended {other}"))),
    }
}
