//! Usage subcommand

use clap::Parser;

use super::{Cli, CliError};
use crate::quota::{current_month, ApiCategory, FileQuotaLedger, QuotaCounters, QuotaLedger};

/// Show the stored monthly API call counters
#[derive(Parser, Debug)]
pub struct UsageCommand {
    /// Print as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl UsageCommand {
    /// Execute the usage command
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let ledger = FileQuotaLedger::new(&cli.usage_file);
        let counters = ledger.load()?;
        println!("{}", self.render(&counters, current_month()));
        Ok(())
    }

    /// Text printed for `counters`; stale months show as zero
    pub fn render(&self, counters: &QuotaCounters, month: u32) -> String {
        let counters = if counters.last_reset_month == month {
            *counters
        } else {
            QuotaCounters::zero(month)
        };

        if self.json {
            return serde_json::to_string_pretty(&counters).unwrap_or_default();
        }

        let rows = [
            (ApiCategory::NearbySearch, counters.nearby_search_calls),
            (ApiCategory::PlaceDetails, counters.place_details_calls),
            (ApiCategory::PlacePhoto, counters.place_photo_calls),
        ];
        let mut out = format!("API usage for month {}:", counters.last_reset_month);
        for (category, calls) in rows {
            out.push_str(&format!("\n  {category}: {calls}"));
        }
        out
    }
}
