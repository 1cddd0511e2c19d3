//! Core types for ingestion: series, fetch windows, upsert outcomes and
//! report metrics.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::canonical::format_date;
use crate::error::ParseError;

/// A day-indexed time series kept in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Series {
    /// Hourly air-quality history (OpenWeather air pollution API).
    AirPollution,
    /// Daily historical weather (Weatherstack historical API).
    Weather,
}

impl Series {
    /// All known series.
    pub const ALL: [Series; 2] = [Series::AirPollution, Series::Weather];

    /// Name used in configuration, the cursor table and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Series::AirPollution => "air-pollution",
            Series::Weather => "weather",
        }
    }

    /// SQLite table holding the series.
    #[must_use]
    pub fn table(&self) -> &'static str {
        match self {
            Series::AirPollution => "air_pollution",
            Series::Weather => "weather",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Series {
    type Err = ParseError;

    /// Parse a series name.
    ///
    /// # Examples
    ///
    /// ```
    /// use airwx_types::Series;
    ///
    /// assert_eq!("air-pollution".parse::<Series>(), Ok(Series::AirPollution));
    /// assert_eq!("air_pollution".parse::<Series>(), Ok(Series::AirPollution));
    /// assert_eq!("Weather".parse::<Series>(), Ok(Series::Weather));
    /// assert!("crime".parse::<Series>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "air-pollution" | "air_pollution" | "pollution" => Ok(Series::AirPollution),
            "weather" => Ok(Series::Weather),
            other => Err(ParseError::UnknownSeries(other.to_string())),
        }
    }
}

/// Half-open `[start, end)` range of calendar days requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FetchWindow {
    /// First day (inclusive).
    pub start: Date,
    /// Day after the last day (exclusive).
    pub end: Date,
}

impl FetchWindow {
    /// Create a window. `end` is exclusive.
    #[must_use]
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Number of days covered.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).whole_days().max(0)
    }

    /// True when the window covers no day.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when `date` lies inside the window.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }

    /// The last day covered (inclusive end), if any.
    #[must_use]
    pub fn last_day(&self) -> Option<Date> {
        if self.is_empty() {
            None
        } else {
            self.end.previous_day()
        }
    }

    /// Iterate over every day in the window, in order.
    pub fn dates(&self) -> impl Iterator<Item = Date> + use<> {
        let end = self.end;
        std::iter::successors(Some(self.start), |d| d.next_day()).take_while(move |d| *d < end)
    }

    /// Split the window into consecutive sub-windows of at most `chunk_days`.
    ///
    /// A `chunk_days` of zero is treated as one.
    #[must_use]
    pub fn chunks(&self, chunk_days: u32) -> Vec<FetchWindow> {
        let step = Duration::days(i64::from(chunk_days.max(1)));
        let mut chunks = Vec::new();
        let mut start = self.start;
        while start < self.end {
            let end = start.saturating_add(step).min(self.end);
            chunks.push(FetchWindow::new(start, end));
            start = end;
        }
        chunks
    }

    /// UNIX timestamp of `start` at UTC midnight.
    #[must_use]
    pub fn start_timestamp(&self) -> i64 {
        self.start.midnight().assume_utc().unix_timestamp()
    }

    /// UNIX timestamp of `end` at UTC midnight.
    #[must_use]
    pub fn end_timestamp(&self) -> i64 {
        self.end.midnight().assume_utc().unix_timestamp()
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", format_date(self.start), format_date(self.end))
    }
}

/// Geographic position of a fixed measurement location.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Acknowledgement of a store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UpsertOutcome {
    /// A new row was written.
    Inserted,
    /// A row with the same canonical key already existed; nothing changed.
    Skipped,
}

/// Numeric weather column usable in the joined report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum WeatherMetric {
    MinTemp,
    MaxTemp,
    #[default]
    AvgTemp,
    TotalSnow,
    SunHour,
    UvIndex,
}

impl WeatherMetric {
    /// Column name in the `weather` table.
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            WeatherMetric::MinTemp => "mintemp",
            WeatherMetric::MaxTemp => "maxtemp",
            WeatherMetric::AvgTemp => "avgtemp",
            WeatherMetric::TotalSnow => "totalsnow",
            WeatherMetric::SunHour => "sunhour",
            WeatherMetric::UvIndex => "uv_index",
        }
    }

    /// Human-readable label for report headers.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            WeatherMetric::MinTemp => "Minimum Temperature",
            WeatherMetric::MaxTemp => "Maximum Temperature",
            WeatherMetric::AvgTemp => "Temperature",
            WeatherMetric::TotalSnow => "Snowfall",
            WeatherMetric::SunHour => "Sun Hours",
            WeatherMetric::UvIndex => "UV Index",
        }
    }
}

impl FromStr for WeatherMetric {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mintemp" | "min-temp" => Ok(WeatherMetric::MinTemp),
            "maxtemp" | "max-temp" => Ok(WeatherMetric::MaxTemp),
            "avgtemp" | "avg-temp" | "temperature" => Ok(WeatherMetric::AvgTemp),
            "totalsnow" | "total-snow" | "snow" => Ok(WeatherMetric::TotalSnow),
            "sunhour" | "sun-hour" => Ok(WeatherMetric::SunHour),
            "uv_index" | "uv-index" | "uv" => Ok(WeatherMetric::UvIndex),
            other => Err(ParseError::UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for WeatherMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Numeric air-pollution column usable in the joined report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PollutionMetric {
    #[default]
    Aqi,
    Co,
    No,
    No2,
    O3,
    So2,
    Pm2_5,
    Pm10,
    Nh3,
}

impl PollutionMetric {
    /// Column name in the `air_pollution` table.
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            PollutionMetric::Aqi => "aqi",
            PollutionMetric::Co => "co",
            PollutionMetric::No => "no",
            PollutionMetric::No2 => "no2",
            PollutionMetric::O3 => "o3",
            PollutionMetric::So2 => "so2",
            PollutionMetric::Pm2_5 => "pm2_5",
            PollutionMetric::Pm10 => "pm10",
            PollutionMetric::Nh3 => "nh3",
        }
    }

    /// Human-readable label for report headers.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            PollutionMetric::Aqi => "Pollution Level",
            PollutionMetric::Co => "CO",
            PollutionMetric::No => "NO",
            PollutionMetric::No2 => "NO2",
            PollutionMetric::O3 => "O3",
            PollutionMetric::So2 => "SO2",
            PollutionMetric::Pm2_5 => "PM2.5",
            PollutionMetric::Pm10 => "PM10",
            PollutionMetric::Nh3 => "NH3",
        }
    }
}

impl FromStr for PollutionMetric {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aqi" => Ok(PollutionMetric::Aqi),
            "co" => Ok(PollutionMetric::Co),
            "no" => Ok(PollutionMetric::No),
            "no2" => Ok(PollutionMetric::No2),
            "o3" => Ok(PollutionMetric::O3),
            "so2" => Ok(PollutionMetric::So2),
            "pm2_5" | "pm2.5" | "pm25" => Ok(PollutionMetric::Pm2_5),
            "pm10" => Ok(PollutionMetric::Pm10),
            "nh3" => Ok(PollutionMetric::Nh3),
            other => Err(ParseError::UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for PollutionMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_series_names() {
        assert_eq!(Series::AirPollution.table(), "air_pollution");
        assert_eq!(Series::Weather.table(), "weather");
        for series in Series::ALL {
            assert_eq!(series.as_str().parse::<Series>().unwrap(), series);
        }
    }

    #[test]
    fn test_window_days_and_contains() {
        let window = FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 26));
        assert_eq!(window.days(), 25);
        assert!(window.contains(date!(2021 - 01 - 01)));
        assert!(window.contains(date!(2021 - 01 - 25)));
        assert!(!window.contains(date!(2021 - 01 - 26)));
        assert_eq!(window.last_day(), Some(date!(2021 - 01 - 25)));
    }

    #[test]
    fn test_window_dates_iterates_half_open() {
        let window = FetchWindow::new(date!(2021 - 02 - 27), date!(2021 - 03 - 02));
        let dates: Vec<_> = window.dates().collect();
        assert_eq!(
            dates,
            vec![
                date!(2021 - 02 - 27),
                date!(2021 - 02 - 28),
                date!(2021 - 03 - 01)
            ]
        );
    }

    #[test]
    fn test_empty_window() {
        let day = date!(2021 - 01 - 01);
        let window = FetchWindow::new(day, day);
        assert!(window.is_empty());
        assert_eq!(window.days(), 0);
        assert_eq!(window.last_day(), None);
        assert_eq!(window.dates().count(), 0);
        assert!(window.chunks(1).is_empty());
    }

    #[test]
    fn test_window_chunks_cover_window() {
        let window = FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 11));
        let chunks = window.chunks(4);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 05)));
        assert_eq!(chunks[2], FetchWindow::new(date!(2021 - 01 - 09), date!(2021 - 01 - 11)));

        let daily = window.chunks(0);
        assert_eq!(daily.len(), 10);
        assert!(daily.iter().all(|c| c.days() == 1));
    }

    #[test]
    fn test_window_timestamps() {
        let window = FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 02));
        assert_eq!(window.start_timestamp(), 1_609_459_200);
        assert_eq!(window.end_timestamp(), 1_609_545_600);
    }

    #[test]
    fn test_window_display() {
        let window = FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 26));
        assert_eq!(window.to_string(), "[2021-01-01, 2021-01-26)");
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("avgtemp".parse::<WeatherMetric>().unwrap(), WeatherMetric::AvgTemp);
        assert_eq!("pm2.5".parse::<PollutionMetric>().unwrap(), PollutionMetric::Pm2_5);
        assert!("humidity".parse::<WeatherMetric>().is_err());
        assert_eq!(PollutionMetric::default().column(), "aqi");
        assert_eq!(WeatherMetric::default().label(), "Temperature");
    }
}
