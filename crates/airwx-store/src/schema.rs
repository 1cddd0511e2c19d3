//! Database schema.

use rusqlite::Connection;

use airwx_types::Series;

use crate::error::Result;

/// Create all tables if they do not exist yet.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Hourly air-quality history, one row per canonical timestamp
        CREATE TABLE IF NOT EXISTS air_pollution (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            latitude REAL,
            longitude REAL,
            aqi INTEGER,
            co REAL,
            no REAL,
            no2 REAL,
            o3 REAL,
            so2 REAL,
            pm2_5 REAL,
            pm10 REAL,
            nh3 REAL,
            timestamp TEXT NOT NULL UNIQUE
        );

        -- Daily weather history, one row per canonical timestamp
        CREATE TABLE IF NOT EXISTS weather (
            weather_id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL UNIQUE,
            mintemp REAL,
            maxtemp REAL,
            avgtemp REAL,
            totalsnow REAL,
            sunhour REAL,
            uv_index REAL,
            sunrise TEXT,
            sunset TEXT,
            moonrise TEXT,
            moonset TEXT,
            moon_phase TEXT,
            moon_illumination INTEGER
        );

        -- Resume cursor per series (next date to fetch, YYYY-MM-DD)
        CREATE TABLE IF NOT EXISTS ingest_cursor (
            series TEXT PRIMARY KEY,
            next_date TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;

    Ok(())
}

/// Measurement columns of a series table, in insert order.
pub(crate) fn measurement_columns(series: Series) -> &'static [&'static str] {
    match series {
        Series::AirPollution => &[
            "aqi", "co", "no", "no2", "o3", "so2", "pm2_5", "pm10", "nh3",
        ],
        Series::Weather => &[
            "mintemp",
            "maxtemp",
            "avgtemp",
            "totalsnow",
            "sunhour",
            "uv_index",
            "sunrise",
            "sunset",
            "moonrise",
            "moonset",
            "moon_phase",
            "moon_illumination",
        ],
    }
}

/// Columns selected when reading rows back, row id first.
pub(crate) fn select_columns(series: Series) -> String {
    let (id, extra) = match series {
        Series::AirPollution => ("id", "latitude, longitude, "),
        Series::Weather => ("weather_id", ""),
    };
    format!(
        "{id}, {extra}timestamp, {}",
        measurement_columns(series).join(", ")
    )
}

/// SQL condition matching all-null placeholder rows.
pub(crate) fn all_null_condition(series: Series) -> String {
    measurement_columns(series)
        .iter()
        .map(|column| format!("{column} IS NULL"))
        .collect::<Vec<_>>()
        .join(" AND ")
}
