//! Data models for stored data.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use airwx_types::{CanonicalKey, Coordinates, MeasurementRecord, Series};

/// A measurement row read back from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Database row ID.
    pub id: i64,
    /// Canonical key and measurement values.
    pub record: MeasurementRecord,
    /// Location the row was fetched for (air pollution only).
    pub location: Option<Coordinates>,
}

impl StoredRecord {
    /// Canonical timestamp of the row.
    pub fn key(&self) -> CanonicalKey {
        self.record.key
    }

    /// Series the row belongs to.
    pub fn series(&self) -> Series {
        self.record.series()
    }

    /// True when the row is an all-null placeholder.
    pub fn is_sentinel(&self) -> bool {
        self.record.is_sentinel()
    }
}

/// Persisted resume cursor for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    /// Series the cursor belongs to.
    pub series: Series,
    /// Next calendar date to fetch.
    pub next_date: Date,
    /// When the cursor was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row count and key range of one series table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Series described.
    pub series: Series,
    /// Number of rows, sentinels included.
    pub rows: u64,
    /// Number of all-null placeholder rows.
    pub sentinels: u64,
    /// Oldest canonical key.
    pub first: Option<CanonicalKey>,
    /// Newest canonical key.
    pub last: Option<CanonicalKey>,
}

/// One line of the joined weather / air-quality report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Canonical key shared by both series.
    pub timestamp: CanonicalKey,
    /// Average of the chosen weather column, `None` when every value was null.
    pub weather: Option<f64>,
    /// Average of the chosen pollution column, `None` when every value was null.
    pub pollution: Option<f64>,
}
