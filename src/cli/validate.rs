//! Validation subcommand

use clap::Parser;

use super::download::{load_preferences, InputArgs};
use super::{Cli, CliError};
use crate::downloader::DownloadJob;

/// Validate run inputs without calling the API
#[derive(Parser, Debug)]
pub struct ValidateCommand {
    /// Inputs to check
    #[command(flatten)]
    pub inputs: InputArgs,
}

impl ValidateCommand {
    /// Execute the validation command
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let prefs = load_preferences(&cli.prefs_file);
        let raw = self.inputs.resolve(&prefs);

        match DownloadJob::from_inputs(&raw) {
            Ok(job) => {
                println!("Inputs are valid");
                println!("  Center: {},{}", job.center.lat, job.center.lng);
                println!("  Radius: {} km ({} m)", job.radius_km, job.radius_meters());
                println!("  Limit: {}", job.result_limit);
                println!("  Workbook: {}", job.xlsx_path.display());
                println!(
                    "  Photos: {}",
                    if job.save_images {
                        job.output_dir.display().to_string()
                    } else {
                        "not saved".to_string()
                    }
                );
                Ok(())
            }
            Err(errors) => {
                for error in &errors.errors {
                    eprintln!("Error: {error}");
                }
                Err(errors.into())
            }
        }
    }
}
