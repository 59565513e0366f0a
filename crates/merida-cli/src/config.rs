//! CLI settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{CliError, CliResult};

/// Gets the default credential file path (`~/.merida/credentials.json`).
pub fn default_credentials_path() -> CliResult<PathBuf> {
    let home = dirs_next::home_dir().ok_or_else(|| {
        CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine home directory",
        ))
    })?;
    Ok(home.join(".merida").join("credentials.json"))
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
    /// Quiet (identifiers only).
    Quiet,
}

/// Maps the verbosity flag to a default log filter.
#[must_use]
pub const fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "merida_cli=debug,merida_auth=debug,merida_api=debug"
    } else {
        "warn"
    }
}
