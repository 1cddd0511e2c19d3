//! Shared helpers for command implementations.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use airwx_store::Store;

/// Open the database, creating it on first use.
pub fn open_store(path: &Path) -> Result<Store> {
    debug!("Opening database {}", path.display());
    Store::open(path).with_context(|| format!("Failed to open database: {}", path.display()))
}

/// Write output to file or stdout
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

/// Render an optional number, blank when missing.
pub fn format_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
