//! Error types for parsing in airwx-types.

use thiserror::Error;

/// Errors that can occur when parsing timestamps, dates or names.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A provider timestamp could not be parsed.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A UNIX timestamp is outside the representable date range.
    #[error("UNIX timestamp out of range: {0}")]
    EpochOutOfRange(i64),

    /// A calendar date (`YYYY-MM-DD`) could not be parsed.
    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// Unknown series name.
    #[error("Unknown series: {0} (expected air-pollution or weather)")]
    UnknownSeries(String),

    /// Unknown canonicalization policy.
    #[error("Unknown granularity: {0} (expected full or daily-noon)")]
    UnknownGranularity(String),

    /// Unknown report metric.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
}

/// Result type alias using airwx-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
