//! Resume cursor: where the next run starts.
//!
//! The cursor is the next calendar date to fetch for a series. It can live in
//! a small marker file, in the store's `ingest_cursor` table, or be derived
//! from the newest stored row. Reading it never fails: a missing or unreadable
//! cursor is logged and the configured epoch is used instead.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::Date;
use time::macros::date;
use tracing::{debug, info, warn};

use airwx_store::Store;
use airwx_types::{ParseError, Series, format_date, parse_date};

use crate::error::{Error, Result};

/// Start date used when no cursor has been persisted yet.
pub const DEFAULT_EPOCH: Date = date!(2021 - 01 - 01);

/// Where the resume cursor of a series is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CursorSource {
    /// A file holding a single `YYYY-MM-DD` line, rewritten after each run.
    StateFile(PathBuf),
    /// The store's `ingest_cursor` row, written in the same transaction as
    /// the run's records.
    #[default]
    Table,
    /// The day after the newest stored canonical key.
    MaxStored,
}

impl CursorSource {
    /// Short name used in logs and configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            CursorSource::StateFile(_) => "file",
            CursorSource::Table => "table",
            CursorSource::MaxStored => "max-stored",
        }
    }
}

/// Default marker file location for a series inside `dir`.
pub fn state_file_path(dir: &Path, series: Series) -> PathBuf {
    dir.join(format!("{}_last_processed_date.txt", series.table()))
}

/// Resolve the next date to fetch for `series`.
///
/// Absence or unreadability of the persisted state is treated as the initial
/// condition and yields `epoch`.
pub fn resolve_cursor(source: &CursorSource, store: &Store, series: Series, epoch: Date) -> Date {
    let resolved = match source {
        CursorSource::StateFile(path) => match read_state_file(path) {
            Ok(Some(date)) => Some(date),
            Ok(None) => {
                info!("No cursor file at {}", path.display());
                None
            }
            Err(e) => {
                warn!("Ignoring unreadable cursor file {}: {}", path.display(), e);
                None
            }
        },
        CursorSource::Table => match store.get_cursor(series) {
            Ok(Some(state)) => Some(state.next_date),
            Ok(None) => {
                info!("No stored cursor for {}", series);
                None
            }
            Err(e) => {
                warn!("Failed to read stored cursor for {}: {}", series, e);
                None
            }
        },
        CursorSource::MaxStored => match store.latest_key(series) {
            Ok(Some(key)) => Some(key.date().next_day().unwrap_or(key.date())),
            Ok(None) => {
                info!("No stored {} records", series);
                None
            }
            Err(e) => {
                warn!("Failed to read latest {} record: {}", series, e);
                None
            }
        },
    };

    match resolved {
        Some(date) => {
            debug!("Resolved {} cursor from {}: {}", series, source.kind(), format_date(date));
            date
        }
        None => {
            info!("Starting {} from epoch {}", series, format_date(epoch));
            epoch
        }
    }
}

/// Read a cursor marker file.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_state_file(path: &Path) -> std::result::Result<Option<Date>, StateFileError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse_date(&contents)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Why a cursor marker file could not be read.
#[derive(Debug, thiserror::Error)]
pub enum StateFileError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Replace the cursor marker file atomically (temp file, then rename).
pub fn write_state_file(path: &Path, next_date: Date) -> Result<()> {
    let to_error = |source| Error::StateFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, format!("{}\n", format_date(next_date))).map_err(to_error)?;
    fs::rename(&tmp, path).map_err(to_error)?;

    debug!("Wrote cursor {} to {}", format_date(next_date), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use airwx_types::{CanonicalKey, MeasurementRecord};

    #[test]
    fn test_missing_sources_fall_back_to_epoch() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let file = CursorSource::StateFile(dir.path().join("missing.txt"));

        for source in [file, CursorSource::Table, CursorSource::MaxStored] {
            assert_eq!(
                resolve_cursor(&source, &store, Series::AirPollution, DEFAULT_EPOCH),
                DEFAULT_EPOCH
            );
        }
    }

    #[test]
    fn test_state_file_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = state_file_path(dir.path(), Series::AirPollution);

        write_state_file(&path, date!(2021 - 01 - 26)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "2021-01-26\n");
        assert_eq!(
            resolve_cursor(
                &CursorSource::StateFile(path.clone()),
                &store,
                Series::AirPollution,
                DEFAULT_EPOCH
            ),
            date!(2021 - 01 - 26)
        );

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_corrupt_state_file_uses_epoch() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor.txt");
        fs::write(&path, "not a date").unwrap();

        assert!(read_state_file(&path).is_err());
        assert_eq!(
            resolve_cursor(
                &CursorSource::StateFile(path),
                &store,
                Series::Weather,
                date!(2022 - 06 - 01)
            ),
            date!(2022 - 06 - 01)
        );
    }

    #[test]
    fn test_table_cursor() {
        let store = Store::open_in_memory().unwrap();
        store
            .set_cursor(Series::Weather, date!(2021 - 02 - 20))
            .unwrap();

        assert_eq!(
            resolve_cursor(&CursorSource::Table, &store, Series::Weather, DEFAULT_EPOCH),
            date!(2021 - 02 - 20)
        );
        assert_eq!(
            resolve_cursor(
                &CursorSource::Table,
                &store,
                Series::AirPollution,
                DEFAULT_EPOCH
            ),
            DEFAULT_EPOCH
        );
    }

    #[test]
    fn test_max_stored_cursor_is_day_after_latest() {
        let store = Store::open_in_memory().unwrap();
        let key = CanonicalKey::noon(date!(2021 - 03 - 10));
        store
            .upsert(&MeasurementRecord::sentinel(Series::Weather, key), None)
            .unwrap();

        assert_eq!(
            resolve_cursor(
                &CursorSource::MaxStored,
                &store,
                Series::Weather,
                DEFAULT_EPOCH
            ),
            date!(2021 - 03 - 11)
        );
    }

    #[test]
    fn test_state_file_path() {
        let path = state_file_path(Path::new("/var/lib/airwx"), Series::AirPollution);
        assert_eq!(
            path,
            Path::new("/var/lib/airwx/air_pollution_last_processed_date.txt")
        );
    }
}
