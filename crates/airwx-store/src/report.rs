//! Joined weather / air-quality report.
//!
//! Rows of both series that share a canonical key are joined, averaged per
//! key and written as tab-separated text:
//!
//! ```text
//! Timestamp	Average Temperature	Average Pollution Level
//! 2021-01-01 12:00:00	-1.00	2.00
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rusqlite::types::Type;
use tracing::{debug, info};

use airwx_types::{CanonicalKey, PollutionMetric, WeatherMetric};

use crate::error::Result;
use crate::models::ReportRow;
use crate::store::Store;

impl Store {
    /// Average a weather column and a pollution column per shared timestamp.
    ///
    /// Only keys present in both tables appear, in chronological order.
    pub fn joined_report(
        &self,
        weather: WeatherMetric,
        pollution: PollutionMetric,
    ) -> Result<Vec<ReportRow>> {
        let sql = format!(
            "SELECT w.timestamp, AVG(w.{}), AVG(p.{})
             FROM weather w
             JOIN air_pollution p ON w.timestamp = p.timestamp
             GROUP BY w.timestamp
             ORDER BY w.timestamp",
            weather.column(),
            pollution.column()
        );

        debug!("Executing report query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                let text: String = row.get(0)?;
                let timestamp = CanonicalKey::parse(&text).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                })?;
                Ok(ReportRow {
                    timestamp,
                    weather: row.get(1)?,
                    pollution: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Write the joined report to `path`, returning the number of data rows.
    pub fn export_report<P: AsRef<Path>>(
        &self,
        path: P,
        weather: WeatherMetric,
        pollution: PollutionMetric,
    ) -> Result<usize> {
        let rows = self.joined_report(weather, pollution)?;
        let file = File::create(path.as_ref())?;
        write_report(file, &rows, weather, pollution)?;
        info!(
            "Wrote {} report rows to {}",
            rows.len(),
            path.as_ref().display()
        );
        Ok(rows.len())
    }
}

/// Render report rows as tab-separated text with a header line.
///
/// Averages are printed with two decimals. A missing average prints as
/// `0.00`.
pub fn write_report<W: Write>(
    writer: W,
    rows: &[ReportRow],
    weather: WeatherMetric,
    pollution: PollutionMetric,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    wtr.write_record([
        "Timestamp".to_string(),
        format!("Average {}", weather.label()),
        format!("Average {}", pollution.label()),
    ])?;

    for row in rows {
        wtr.write_record([
            row.timestamp.to_string(),
            format_average(row.weather),
            format_average(row.pollution),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn format_average(value: Option<f64>) -> String {
    format!("{:.2}", value.unwrap_or(0.0))
}
