//! CLI command implementations

pub mod download;
pub mod error;
pub mod usage;
pub mod validate;

pub use download::{Cli, Commands, DownloadArgs, InputArgs};
pub use error::CliError;
pub use usage::UsageCommand;
pub use validate::ValidateCommand;
