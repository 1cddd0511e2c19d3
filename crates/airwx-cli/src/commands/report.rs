//! Report command - joined weather / air-pollution averages as TSV.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use airwx_store::write_report;
use airwx_types::{PollutionMetric, WeatherMetric};

use crate::util::open_store;

/// Execute the report command.
pub fn cmd_report(
    database: &Path,
    output: Option<&Path>,
    weather: WeatherMetric,
    pollution: PollutionMetric,
    quiet: bool,
) -> Result<()> {
    let store = open_store(database)?;

    match output {
        Some(path) => {
            let rows = store
                .export_report(path, weather, pollution)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!("Wrote {} rows to {}", rows, path.display());
            }
        }
        None => {
            let rows = store.joined_report(weather, pollution)?;
            write_report(io::stdout().lock(), &rows, weather, pollution)?;
        }
    }

    Ok(())
}
