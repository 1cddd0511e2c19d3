//! Main store implementation.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

use airwx_types::{
    AirQuality, CanonicalKey, Coordinates, DailyWeather, MeasurementFields, MeasurementRecord,
    Series, UpsertOutcome, format_date, parse_date,
};

use crate::error::{Error, Result};
use crate::models::{CursorState, SeriesStats, StoredRecord};
use crate::queries::RecordQuery;
use crate::schema;

/// SQLite-based store for weather and air-quality series.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Start an atomic batch of writes to one series.
    ///
    /// Nothing the batch writes is visible to other connections until
    /// [`Batch::commit`]. Dropping the batch without committing rolls back
    /// every row and cursor update it made.
    ///
    /// `location` is recorded with air-pollution rows and ignored for weather.
    pub fn begin_batch(
        &mut self,
        series: Series,
        location: Option<Coordinates>,
    ) -> Result<Batch<'_>> {
        let tx = self.conn.transaction()?;
        debug!("Started {} batch", series);
        Ok(Batch {
            tx,
            series,
            location,
            inserted: 0,
            skipped: 0,
        })
    }

    /// Write a single record outside of a batch.
    pub fn upsert(
        &self,
        record: &MeasurementRecord,
        location: Option<Coordinates>,
    ) -> Result<UpsertOutcome> {
        insert_record(&self.conn, record, location)
    }
}

/// An open write transaction against one series table.
pub struct Batch<'a> {
    tx: Transaction<'a>,
    series: Series,
    location: Option<Coordinates>,
    inserted: usize,
    skipped: usize,
}

impl Batch<'_> {
    /// Series this batch writes to.
    pub fn series(&self) -> Series {
        self.series
    }

    /// Insert a record unless its canonical key is already stored.
    ///
    /// An existing row is never modified; the write is reported as
    /// [`UpsertOutcome::Skipped`].
    pub fn upsert(&mut self, record: &MeasurementRecord) -> Result<UpsertOutcome> {
        if record.series() != self.series {
            return Err(Error::SeriesMismatch {
                record: record.series(),
                target: self.series,
            });
        }

        let outcome = insert_record(&self.tx, record, self.location)?;
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Skipped => self.skipped += 1,
        }
        Ok(outcome)
    }

    /// Record the resume cursor inside this transaction.
    pub fn set_cursor(&self, next_date: Date) -> Result<()> {
        write_cursor(&self.tx, self.series, next_date)
    }

    /// Rows inserted so far.
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// Writes skipped so far because the key already existed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Make every write of the batch durable.
    pub fn commit(self) -> Result<()> {
        let (series, inserted, skipped) = (self.series, self.inserted, self.skipped);
        self.tx.commit()?;
        info!(
            "Committed {} batch: {} inserted, {} skipped",
            series, inserted, skipped
        );
        Ok(())
    }
}

fn insert_record(
    conn: &Connection,
    record: &MeasurementRecord,
    location: Option<Coordinates>,
) -> Result<UpsertOutcome> {
    let key = record.key.to_string();

    let changed = match &record.fields {
        MeasurementFields::AirPollution(aq) => conn.execute(
            "INSERT INTO air_pollution (latitude, longitude, aqi, co, no, no2, o3, so2,
             pm2_5, pm10, nh3, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(timestamp) DO NOTHING",
            rusqlite::params![
                location.map(|l| l.latitude),
                location.map(|l| l.longitude),
                aq.aqi,
                aq.co,
                aq.no,
                aq.no2,
                aq.o3,
                aq.so2,
                aq.pm2_5,
                aq.pm10,
                aq.nh3,
                key,
            ],
        )?,
        MeasurementFields::Weather(w) => conn.execute(
            "INSERT INTO weather (timestamp, mintemp, maxtemp, avgtemp, totalsnow, sunhour,
             uv_index, sunrise, sunset, moonrise, moonset, moon_phase, moon_illumination)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(timestamp) DO NOTHING",
            rusqlite::params![
                key,
                w.mintemp,
                w.maxtemp,
                w.avgtemp,
                w.totalsnow,
                w.sunhour,
                w.uv_index,
                w.sunrise,
                w.sunset,
                w.moonrise,
                w.moonset,
                w.moon_phase,
                w.moon_illumination,
            ],
        )?,
    };

    if changed == 0 {
        debug!("{} {} already stored", record.series(), key);
        Ok(UpsertOutcome::Skipped)
    } else {
        Ok(UpsertOutcome::Inserted)
    }
}

fn write_cursor(conn: &Connection, series: Series, next_date: Date) -> Result<()> {
    let now = OffsetDateTime::now_utc().unix_timestamp();

    conn.execute(
        "INSERT INTO ingest_cursor (series, next_date, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(series) DO UPDATE SET
            next_date = ?2,
            updated_at = ?3",
        rusqlite::params![series.as_str(), format_date(next_date), now],
    )?;

    debug!("Cursor for {} set to {}", series, format_date(next_date));
    Ok(())
}

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn key_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<CanonicalKey> {
    let text: String = row.get(idx)?;
    CanonicalKey::parse(&text).map_err(|e| conversion_error(idx, Type::Text, e))
}

fn row_to_record(series: Series, row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    match series {
        Series::AirPollution => {
            let latitude: Option<f64> = row.get(1)?;
            let longitude: Option<f64> = row.get(2)?;
            let fields = AirQuality {
                aqi: row.get(4)?,
                co: row.get(5)?,
                no: row.get(6)?,
                no2: row.get(7)?,
                o3: row.get(8)?,
                so2: row.get(9)?,
                pm2_5: row.get(10)?,
                pm10: row.get(11)?,
                nh3: row.get(12)?,
            };
            Ok(StoredRecord {
                id: row.get(0)?,
                record: MeasurementRecord::new(
                    key_at(row, 3)?,
                    MeasurementFields::AirPollution(fields),
                ),
                location: latitude
                    .zip(longitude)
                    .map(|(lat, lon)| Coordinates::new(lat, lon)),
            })
        }
        Series::Weather => {
            let fields = DailyWeather {
                mintemp: row.get(2)?,
                maxtemp: row.get(3)?,
                avgtemp: row.get(4)?,
                totalsnow: row.get(5)?,
                sunhour: row.get(6)?,
                uv_index: row.get(7)?,
                sunrise: row.get(8)?,
                sunset: row.get(9)?,
                moonrise: row.get(10)?,
                moonset: row.get(11)?,
                moon_phase: row.get(12)?,
                moon_illumination: row.get(13)?,
            };
            Ok(StoredRecord {
                id: row.get(0)?,
                record: MeasurementRecord::new(key_at(row, 1)?, MeasurementFields::Weather(fields)),
                location: None,
            })
        }
    }
}

// Record queries
impl Store {
    /// Query stored rows with filters.
    pub fn query_records(&self, query: &RecordQuery) -> Result<Vec<StoredRecord>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let series = query.series;
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_ref.as_slice(), |row| row_to_record(series, row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Get the row stored under a canonical key.
    pub fn get_record(&self, series: Series, key: CanonicalKey) -> Result<Option<StoredRecord>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE timestamp = ?",
            schema::select_columns(series),
            series.table()
        );

        let record = self
            .conn
            .query_row(&sql, [key.to_string()], |row| row_to_record(series, row))
            .optional()?;

        Ok(record)
    }

    /// True when a row exists under the canonical key.
    pub fn contains_key(&self, series: Series, key: CanonicalKey) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE timestamp = ?", series.table());
        let found = self
            .conn
            .query_row(&sql, [key.to_string()], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Count rows of a series, sentinels included.
    pub fn count(&self, series: Series) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", series.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Newest canonical key stored for a series, sentinels included.
    pub fn latest_key(&self, series: Series) -> Result<Option<CanonicalKey>> {
        let sql = format!("SELECT MAX(timestamp) FROM {}", series.table());
        let max: Option<String> = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(max.map(|s| CanonicalKey::parse(&s)).transpose()?)
    }

    /// Row counts and key range of a series.
    pub fn stats(&self, series: Series) -> Result<SeriesStats> {
        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN {} THEN 1 ELSE 0 END), 0),
             MIN(timestamp), MAX(timestamp) FROM {}",
            schema::all_null_condition(series),
            series.table()
        );

        let (rows, sentinels, first, last): (i64, i64, Option<String>, Option<String>) = self
            .conn
            .query_row(&sql, [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;

        Ok(SeriesStats {
            series,
            rows: rows as u64,
            sentinels: sentinels as u64,
            first: first.map(|s| CanonicalKey::parse(&s)).transpose()?,
            last: last.map(|s| CanonicalKey::parse(&s)).transpose()?,
        })
    }
}

// Cursor operations
impl Store {
    /// Get the persisted resume cursor of a series.
    pub fn get_cursor(&self, series: Series) -> Result<Option<CursorState>> {
        let mut stmt = self
            .conn
            .prepare("SELECT next_date, updated_at FROM ingest_cursor WHERE series = ?")?;

        let state = stmt
            .query_row([series.as_str()], |row| {
                let next_date: String = row.get(0)?;
                let updated_at: i64 = row.get(1)?;
                Ok(CursorState {
                    series,
                    next_date: parse_date(&next_date)
                        .map_err(|e| conversion_error(0, Type::Text, e))?,
                    updated_at: OffsetDateTime::from_unix_timestamp(updated_at)
                        .map_err(|e| conversion_error(1, Type::Integer, e))?,
                })
            })
            .optional()?;

        Ok(state)
    }

    /// Set the resume cursor of a series outside of a batch.
    pub fn set_cursor(&self, series: Series, next_date: Date) -> Result<()> {
        write_cursor(&self.conn, series, next_date)
    }

    /// Forget the resume cursor of a series.
    pub fn clear_cursor(&self, series: Series) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM ingest_cursor WHERE series = ?",
            [series.as_str()],
        )?;
        Ok(removed > 0)
    }
}
