//! Error types for airwx-store.

use std::path::PathBuf;

/// Result type for airwx-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in airwx-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record does not belong to the table it was written to.
    #[error("Record for {record} cannot be written to the {target} table")]
    SeriesMismatch {
        record: airwx_types::Series,
        target: airwx_types::Series,
    },

    /// A stored key or date could not be parsed.
    #[error("Invalid stored value: {0}")]
    Parse(#[from] airwx_types::ParseError),

    /// Report export error.
    #[error("Export error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
