//! Cursor command - inspect or move the resume cursor.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use time::Date;
use time::format_description::well_known::Rfc3339;

use airwx_core::{CursorSource, resolve_cursor, write_state_file};
use airwx_store::Store;
use airwx_types::{Series, format_date};

use crate::cli::CursorAction;
use crate::config::{Config, describe_cursor_source};
use crate::util::open_store;

/// Execute the cursor command.
pub fn cmd_cursor(action: CursorAction, database: &Path, config: &Config) -> Result<()> {
    let store = open_store(database)?;

    match action {
        CursorAction::Show { series } => {
            let epoch = config.epoch_date()?;
            let selected = match series {
                Some(s) => vec![s],
                None => Series::ALL.to_vec(),
            };
            for series in selected {
                show_cursor(&store, config, series, epoch)?;
            }
            Ok(())
        }
        CursorAction::Set { series, date } => {
            set_cursor(&store, &config.cursor_source(series), series, date)?;
            println!("Next {} run starts at {}", series, format_date(date));
            Ok(())
        }
        CursorAction::Clear { series } => {
            if clear_cursor(&store, &config.cursor_source(series), series)? {
                println!("Cleared {} cursor", series);
            } else {
                println!("No {} cursor stored", series);
            }
            Ok(())
        }
    }
}

fn show_cursor(store: &Store, config: &Config, series: Series, epoch: Date) -> Result<()> {
    let source = config.cursor_source(series);
    let next = resolve_cursor(&source, store, series, epoch);
    let stats = store.stats(series)?;

    println!("{}:", series);
    println!("  Next date: {}", format_date(next));
    println!("  Source:    {}", describe_cursor_source(&source));
    if source == CursorSource::Table
        && let Some(state) = store.get_cursor(series)?
    {
        println!("  Updated:   {}", state.updated_at.format(&Rfc3339)?);
    }
    println!("  Records:   {} ({} placeholders)", stats.rows, stats.sentinels);
    if let (Some(first), Some(last)) = (stats.first, stats.last) {
        println!("  Stored:    {} .. {}", first, last);
    }
    Ok(())
}

fn set_cursor(store: &Store, source: &CursorSource, series: Series, date: Date) -> Result<()> {
    match source {
        CursorSource::Table => store.set_cursor(series, date)?,
        CursorSource::StateFile(path) => write_state_file(path, date)?,
        CursorSource::MaxStored => {
            bail!("The max-stored cursor follows the stored records and cannot be set")
        }
    }
    Ok(())
}

fn clear_cursor(store: &Store, source: &CursorSource, series: Series) -> Result<bool> {
    match source {
        CursorSource::Table => Ok(store.clear_cursor(series)?),
        CursorSource::StateFile(path) => {
            if !path.exists() {
                return Ok(false);
            }
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            Ok(true)
        }
        CursorSource::MaxStored => {
            bail!("The max-stored cursor follows the stored records and cannot be cleared")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airwx_core::{DEFAULT_EPOCH, state_file_path};
    use time::macros::date;

    #[test]
    fn test_set_and_clear_table_cursor() {
        let store = Store::open_in_memory().unwrap();
        let source = CursorSource::Table;

        set_cursor(&store, &source, Series::Weather, date!(2021 - 02 - 01)).unwrap();
        assert_eq!(
            resolve_cursor(&source, &store, Series::Weather, DEFAULT_EPOCH),
            date!(2021 - 02 - 01)
        );

        assert!(clear_cursor(&store, &source, Series::Weather).unwrap());
        assert!(!clear_cursor(&store, &source, Series::Weather).unwrap());
        assert_eq!(
            resolve_cursor(&source, &store, Series::Weather, DEFAULT_EPOCH),
            DEFAULT_EPOCH
        );
    }

    #[test]
    fn test_set_and_clear_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in_memory().unwrap();
        let source = CursorSource::StateFile(state_file_path(dir.path(), Series::AirPollution));

        set_cursor(&store, &source, Series::AirPollution, date!(2021 - 03 - 05)).unwrap();
        assert_eq!(
            resolve_cursor(&source, &store, Series::AirPollution, DEFAULT_EPOCH),
            date!(2021 - 03 - 05)
        );
        // The table cursor is untouched.
        assert!(store.get_cursor(Series::AirPollution).unwrap().is_none());

        assert!(clear_cursor(&store, &source, Series::AirPollution).unwrap());
        assert!(!clear_cursor(&store, &source, Series::AirPollution).unwrap());
    }

    #[test]
    fn test_max_stored_cannot_be_moved() {
        let store = Store::open_in_memory().unwrap();
        let source = CursorSource::MaxStored;
        assert!(set_cursor(&store, &source, Series::Weather, date!(2021 - 01 - 05)).is_err());
        assert!(clear_cursor(&store, &source, Series::Weather).is_err());
    }

    #[test]
    fn test_show_all_series() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("data.db");
        cmd_cursor(CursorAction::Show { series: None }, &db, &Config::default()).unwrap();
    }
}
