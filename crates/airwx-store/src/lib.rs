//! Local data persistence for airwx weather and air-quality series.
//!
//! This crate provides SQLite-based storage for daily series fetched from
//! remote providers, with one table per series and the canonical timestamp
//! as the uniqueness key.
//!
//! # Features
//!
//! - Insert-if-absent writes reporting whether a row was added or skipped
//! - Atomic batches that roll back when dropped without a commit
//! - Per-series resume cursor, writable inside the same batch as the rows
//! - Query by series and date range, with pagination
//! - Joined weather / air-quality report as tab-separated text
//!
//! # Example
//!
//! ```
//! use airwx_store::{RecordQuery, Store};
//! use airwx_types::{CanonicalKey, MeasurementRecord, Series, UpsertOutcome};
//! use time::macros::date;
//!
//! let mut store = Store::open_in_memory()?;
//!
//! let key = CanonicalKey::noon(date!(2021 - 01 - 01));
//! let mut batch = store.begin_batch(Series::Weather, None)?;
//! let outcome = batch.upsert(&MeasurementRecord::sentinel(Series::Weather, key))?;
//! assert_eq!(outcome, UpsertOutcome::Inserted);
//! batch.set_cursor(date!(2021 - 01 - 02))?;
//! batch.commit()?;
//!
//! let rows = store.query_records(&RecordQuery::new(Series::Weather).limit(10))?;
//! assert_eq!(rows.len(), 1);
//! # Ok::<(), airwx_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod report;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{CursorState, ReportRow, SeriesStats, StoredRecord};
pub use queries::RecordQuery;
pub use report::write_report;
pub use store::{Batch, Store};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/airwx/data.db`
/// - macOS: `~/Library/Application Support/airwx/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\airwx\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("airwx")
        .join("data.db")
}
