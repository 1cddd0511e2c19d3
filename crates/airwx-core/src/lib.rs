//! Incremental ingestion of weather and air-quality history.
//!
//! This crate decides which days to request next from a remote provider,
//! turns provider timestamps into canonical keys, and writes at most one
//! record per key into an [`airwx_store::Store`], resuming where the
//! previous run stopped.
//!
//! # Features
//!
//! - **Resume cursor**: kept in a marker file, the store, or derived from the newest row
//! - **Fetch windows**: `[cursor, cursor + batch)` split into per-request chunks
//! - **Canonical keys**: one representative noon sample per day, or full timestamps
//! - **Gap filling**: all-null placeholder rows for days without data
//! - **Providers**: OpenWeather air pollution history, Weatherstack historical weather
//! - **Mock provider**: canned samples and failure injection for tests
//!
//! # Quick Start
//!
//! ```no_run
//! use airwx_core::{IngestOptions, Ingestor, OpenWeatherAirPollution};
//! use airwx_store::Store;
//! use airwx_types::{Coordinates, Series};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detroit = Coordinates::new(42.3314, -83.0458);
//! let provider = OpenWeatherAirPollution::new("api-key", detroit)?;
//!
//! let mut store = Store::open_default()?;
//! let ingestor = Ingestor::new(IngestOptions::for_series(Series::AirPollution).location(detroit));
//!
//! let report = ingestor.run(&mut store, &provider)?;
//! println!("{} new rows, next run starts {}", report.stats.written(), report.next_cursor);
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod error;
pub mod ingest;
pub mod mock;
pub mod openweather;
pub mod traits;
pub mod weatherstack;
pub mod window;

pub use cursor::{
    CursorSource, DEFAULT_EPOCH, StateFileError, read_state_file, resolve_cursor,
    state_file_path, write_state_file,
};
pub use error::{Error, Result};
pub use ingest::{DEFAULT_REQUEST_DELAY, IngestOptions, IngestStats, Ingestor, RunReport};
pub use mock::{MockProvider, MockProviderBuilder};
pub use openweather::OpenWeatherAirPollution;
pub use traits::{Provider, RecordSink};
pub use weatherstack::WeatherstackHistorical;
pub use window::{DEFAULT_BATCH_DAYS, advance_cursor, next_window};
