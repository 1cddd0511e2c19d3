//! Records command - list stored rows of a series.

use std::path::Path;

use anyhow::Result;
use time::Date;

use airwx_store::{RecordQuery, StoredRecord};
use airwx_types::{AirQuality, DailyWeather, MeasurementFields, Series};

use crate::cli::RecordFormat;
use crate::util::{format_opt, open_store, write_output};

const AIR_POLLUTION_COLUMNS: &[&str] = &[
    "timestamp", "latitude", "longitude", "aqi", "co", "no", "no2", "o3", "so2", "pm2_5", "pm10",
    "nh3",
];

const WEATHER_COLUMNS: &[&str] = &[
    "timestamp",
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
];

/// Arguments for the records command.
pub struct RecordsArgs {
    pub series: Series,
    pub since: Option<Date>,
    pub until: Option<Date>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub oldest_first: bool,
    pub no_sentinels: bool,
    pub format: RecordFormat,
}

impl RecordsArgs {
    fn query(&self) -> RecordQuery {
        let mut query = RecordQuery::new(self.series);
        if let Some(since) = self.since {
            query = query.since(since);
        }
        if let Some(until) = self.until {
            query = query.until(until);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if self.oldest_first {
            query = query.oldest_first();
        }
        if self.no_sentinels {
            query = query.without_sentinels();
        }
        query
    }
}

/// Execute the records command.
pub fn cmd_records(args: RecordsArgs, database: &Path) -> Result<()> {
    let store = open_store(database)?;
    let records = store.query_records(&args.query())?;

    let content = match args.format {
        RecordFormat::Json => format!("{}\n", serde_json::to_string_pretty(&records)?),
        RecordFormat::Tsv => format_records_tsv(args.series, &records),
        RecordFormat::Text => {
            if records.is_empty() {
                format!(
                    "No {} records stored. Run 'airwx ingest {}' first.\n",
                    args.series, args.series
                )
            } else {
                format_records_text(&records)
            }
        }
    };

    write_output(None, &content)
}

fn format_records_text(records: &[StoredRecord]) -> String {
    let mut output = String::new();
    for stored in records {
        let summary = match &stored.record.fields {
            _ if stored.is_sentinel() => "(no data)".to_string(),
            MeasurementFields::AirPollution(aq) => summarize_air(aq),
            MeasurementFields::Weather(day) => summarize_weather(day),
        };
        output.push_str(&format!("{}  {}\n", stored.key(), summary));
    }
    output
}

fn summarize_air(aq: &AirQuality) -> String {
    format!(
        "AQI {}  PM2.5 {}  PM10 {}  NO2 {}  O3 {}  CO {}",
        format_opt(aq.aqi),
        format_opt(aq.pm2_5),
        format_opt(aq.pm10),
        format_opt(aq.no2),
        format_opt(aq.o3),
        format_opt(aq.co)
    )
}

fn summarize_weather(day: &DailyWeather) -> String {
    let mut line = format!(
        "avg {}°C  min {}°C  max {}°C  snow {}cm  sun {}h",
        format_opt(day.avgtemp),
        format_opt(day.mintemp),
        format_opt(day.maxtemp),
        format_opt(day.totalsnow),
        format_opt(day.sunhour)
    );
    if let Some(phase) = &day.moon_phase {
        line.push_str(&format!("  {}", phase));
    }
    line
}

fn format_records_tsv(series: Series, records: &[StoredRecord]) -> String {
    let header = match series {
        Series::AirPollution => AIR_POLLUTION_COLUMNS,
        Series::Weather => WEATHER_COLUMNS,
    };
    let mut output = header.join("\t");
    output.push('\n');

    for stored in records {
        let timestamp = stored.key().to_string();
        let fields = match &stored.record.fields {
            MeasurementFields::AirPollution(aq) => vec![
                timestamp,
                format_opt(stored.location.map(|c| c.latitude)),
                format_opt(stored.location.map(|c| c.longitude)),
                format_opt(aq.aqi),
                format_opt(aq.co),
                format_opt(aq.no),
                format_opt(aq.no2),
                format_opt(aq.o3),
                format_opt(aq.so2),
                format_opt(aq.pm2_5),
                format_opt(aq.pm10),
                format_opt(aq.nh3),
            ],
            MeasurementFields::Weather(day) => vec![
                timestamp,
                format_opt(day.mintemp),
                format_opt(day.maxtemp),
                format_opt(day.avgtemp),
                format_opt(day.totalsnow),
                format_opt(day.sunhour),
                format_opt(day.uv_index),
                day.sunrise.clone().unwrap_or_default(),
                day.sunset.clone().unwrap_or_default(),
                day.moonrise.clone().unwrap_or_default(),
                day.moonset.clone().unwrap_or_default(),
                day.moon_phase.clone().unwrap_or_default(),
                format_opt(day.moon_illumination),
            ],
        };
        output.push_str(&fields.join("\t"));
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use airwx_types::{CanonicalKey, Coordinates, MeasurementRecord};
    use time::macros::date;

    fn air_row(aqi: Option<i64>) -> StoredRecord {
        StoredRecord {
            id: 1,
            record: MeasurementRecord::new(
                CanonicalKey::noon(date!(2021 - 01 - 01)),
                MeasurementFields::AirPollution(AirQuality {
                    aqi,
                    pm2_5: aqi.map(|_| 4.2),
                    ..Default::default()
                }),
            ),
            location: Some(Coordinates::new(42.3314, -83.0458)),
        }
    }

    #[test]
    fn test_query_from_args() {
        let args = RecordsArgs {
            series: Series::Weather,
            since: Some(date!(2021 - 01 - 01)),
            until: None,
            limit: Some(5),
            offset: None,
            oldest_first: true,
            no_sentinels: true,
            format: RecordFormat::Text,
        };
        let query = args.query();
        assert_eq!(query.series, Series::Weather);
        assert_eq!(query.since, Some(date!(2021 - 01 - 01)));
        assert_eq!(query.limit, Some(5));
        assert!(!query.newest_first);
        assert!(!query.include_sentinels);
    }

    #[test]
    fn test_tsv_air_pollution() {
        let tsv = format_records_tsv(Series::AirPollution, &[air_row(Some(2))]);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("timestamp\tlatitude\tlongitude\taqi"));
        assert_eq!(
            lines[1],
            "2021-01-01 12:00:00\t42.3314\t-83.0458\t2\t\t\t\t\t\t4.2\t\t"
        );
    }

    #[test]
    fn test_text_marks_sentinels() {
        let text = format_records_text(&[air_row(None), air_row(Some(3))]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2021-01-01 12:00:00  (no data)");
        assert!(lines[1].contains("AQI 3"));
        assert!(lines[1].contains("PM2.5 4.2"));
    }

    #[test]
    fn test_weather_summary() {
        let day = DailyWeather {
            avgtemp: Some(-1.0),
            moon_phase: Some("Waning Gibbous".to_string()),
            ..Default::default()
        };
        let line = summarize_weather(&day);
        assert!(line.starts_with("avg -1°C"));
        assert!(line.ends_with("Waning Gibbous"));
    }
}
