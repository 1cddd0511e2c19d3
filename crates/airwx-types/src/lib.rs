//! Shared types for airwx weather and air-quality ingestion.
//!
//! This crate provides the value types used by the store (airwx-store), the
//! ingestion engine (airwx-core) and the command-line tool (airwx-cli).
//!
//! # Features
//!
//! - Series, fetch windows and upsert outcomes
//! - Canonical timestamp keys and the policies that produce them
//! - Typed measurement records, including all-null sentinel records
//! - Error types for timestamp and name parsing
//!
//! # Example
//!
//! ```
//! use airwx_types::{FetchWindow, Granularity, MeasurementRecord, Series};
//! use time::macros::date;
//!
//! let window = FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 26));
//! assert_eq!(window.days(), 25);
//!
//! let key = Granularity::DailyNoon.sentinel_key(window.start);
//! let sentinel = MeasurementRecord::sentinel(Series::AirPollution, key);
//! assert!(sentinel.is_sentinel());
//! ```

pub mod canonical;
pub mod error;
pub mod record;
pub mod types;

pub use canonical::{CANONICAL_HOUR, CanonicalKey, Granularity, format_date, parse_date};
pub use error::{ParseError, ParseResult};
pub use record::{
    AirQuality, DailyWeather, MeasurementFields, MeasurementRecord, RawSample, RawTimestamp,
};
pub use types::{Coordinates, FetchWindow, PollutionMetric, Series, UpsertOutcome, WeatherMetric};
