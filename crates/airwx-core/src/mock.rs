//! Mock provider implementation for testing.
//!
//! This module provides a provider that serves canned samples without any
//! network access.
//!
//! The [`MockProvider`] implements the [`Provider`] trait, allowing it to be
//! used interchangeably with the HTTP clients in the ingestion loop.
//!
//! # Features
//!
//! - **Window filtering**: only samples dated inside the requested window are returned
//! - **Failure injection**: fail every request, or requests touching given days
//! - **Request recording**: count calls and inspect the requested windows

use std::cell::RefCell;
use std::collections::HashSet;

use time::{Date, OffsetDateTime};

use airwx_types::{
    AirQuality, CanonicalKey, DailyWeather, FetchWindow, MeasurementFields, RawSample,
    RawTimestamp, Series,
};

use crate::error::{Error, Result};
use crate::traits::Provider;

/// A provider serving canned samples.
///
/// # Example
///
/// ```
/// use airwx_core::{MockProvider, Provider};
/// use airwx_core::mock::air_sample;
/// use airwx_types::{FetchWindow, Series};
/// use time::macros::{date, datetime};
///
/// let provider = MockProvider::builder(Series::AirPollution)
///     .sample(air_sample(datetime!(2021-01-01 12:00 UTC), 2))
///     .sample(air_sample(datetime!(2021-01-02 12:00 UTC), 3))
///     .build();
///
/// let day = FetchWindow::new(date!(2021 - 01 - 02), date!(2021 - 01 - 03));
/// assert_eq!(provider.fetch(&day).unwrap().len(), 1);
/// assert_eq!(provider.request_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockProvider {
    series: Series,
    samples: Vec<RawSample>,
    failing_days: HashSet<Date>,
    fail_always: bool,
    requests: RefCell<Vec<FetchWindow>>,
}

impl MockProvider {
    /// Create a provider with no samples.
    pub fn new(series: Series) -> Self {
        Self::builder(series).build()
    }

    /// Start building a mock provider.
    pub fn builder(series: Series) -> MockProviderBuilder {
        MockProviderBuilder::new(series)
    }

    /// Number of fetch calls made so far.
    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Windows requested so far, in call order.
    pub fn requested_windows(&self) -> Vec<FetchWindow> {
        self.requests.borrow().clone()
    }

    /// Replace the canned samples.
    pub fn set_samples(&mut self, samples: Vec<RawSample>) {
        self.samples = samples;
    }
}

impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn series(&self) -> Series {
        self.series
    }

    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawSample>> {
        self.requests.borrow_mut().push(*window);

        if self.fail_always {
            return Err(Error::Mock(format!("request for {} failed", window)));
        }
        if let Some(day) = window.dates().find(|d| self.failing_days.contains(d)) {
            return Err(Error::Mock(format!("no service on {}", day)));
        }

        Ok(self
            .samples
            .iter()
            .filter(|sample| sample_date(&sample.timestamp).is_none_or(|d| window.contains(d)))
            .cloned()
            .collect())
    }
}

/// Calendar day of a raw timestamp, if it can be determined.
///
/// Samples with an unreadable timestamp are served for every window so the
/// ingestion loop gets to see them.
fn sample_date(timestamp: &RawTimestamp) -> Option<Date> {
    match timestamp {
        RawTimestamp::Epoch(seconds) => OffsetDateTime::from_unix_timestamp(*seconds)
            .ok()
            .map(|t| t.date()),
        RawTimestamp::Text(text) => CanonicalKey::parse(text).ok().map(|k| k.date()),
    }
}

/// Builder for creating mock providers with custom settings.
#[derive(Debug)]
pub struct MockProviderBuilder {
    series: Series,
    samples: Vec<RawSample>,
    failing_days: HashSet<Date>,
    fail_always: bool,
}

impl MockProviderBuilder {
    /// Create a new builder.
    pub fn new(series: Series) -> Self {
        Self {
            series,
            samples: Vec::new(),
            failing_days: HashSet::new(),
            fail_always: false,
        }
    }

    /// Add a sample, served in insertion order.
    #[must_use]
    pub fn sample(mut self, sample: RawSample) -> Self {
        self.samples.push(sample);
        self
    }

    /// Add several samples.
    #[must_use]
    pub fn samples(mut self, samples: impl IntoIterator<Item = RawSample>) -> Self {
        self.samples.extend(samples);
        self
    }

    /// Fail every request whose window covers `day`.
    #[must_use]
    pub fn fail_on(mut self, day: Date) -> Self {
        self.failing_days.insert(day);
        self
    }

    /// Fail every request.
    #[must_use]
    pub fn fail_always(mut self) -> Self {
        self.fail_always = true;
        self
    }

    /// Build the provider.
    pub fn build(self) -> MockProvider {
        MockProvider {
            series: self.series,
            samples: self.samples,
            failing_days: self.failing_days,
            fail_always: self.fail_always,
            requests: RefCell::new(Vec::new()),
        }
    }
}

/// An air-quality sample at `instant` with the given index and fixed
/// pollutant values.
pub fn air_sample(instant: OffsetDateTime, aqi: i64) -> RawSample {
    RawSample::new(
        RawTimestamp::Epoch(instant.unix_timestamp()),
        MeasurementFields::AirPollution(AirQuality {
            aqi: Some(aqi),
            co: Some(250.34),
            no: Some(0.0),
            no2: Some(12.5),
            o3: Some(48.62),
            so2: Some(3.1),
            pm2_5: Some(4.2),
            pm10: Some(5.7),
            nh3: Some(0.9),
        }),
    )
}

/// A daily weather sample keyed by a `YYYY-MM-DD` text date.
pub fn weather_sample(date: &str, avgtemp: f64) -> RawSample {
    RawSample::new(
        RawTimestamp::Text(date.to_string()),
        MeasurementFields::Weather(DailyWeather {
            mintemp: Some(avgtemp - 3.0),
            maxtemp: Some(avgtemp + 3.0),
            avgtemp: Some(avgtemp),
            totalsnow: Some(0.0),
            sunhour: Some(8.7),
            uv_index: Some(2.0),
            sunrise: Some("08:00 AM".to_string()),
            sunset: Some("05:13 PM".to_string()),
            moonrise: Some("08:29 PM".to_string()),
            moonset: Some("10:09 AM".to_string()),
            moon_phase: Some("Waning Gibbous".to_string()),
            moon_illumination: Some(91),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn test_fetch_filters_by_window() {
        let provider = MockProvider::builder(Series::Weather)
            .sample(weather_sample("2021-01-01", 1.0))
            .sample(weather_sample("2021-01-02", 2.0))
            .sample(weather_sample("2021-01-03", 3.0))
            .build();

        let window = FetchWindow::new(date!(2021 - 01 - 02), date!(2021 - 01 - 04));
        let samples = provider.fetch(&window).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[0].timestamp,
            RawTimestamp::Text("2021-01-02".to_string())
        );
    }

    #[test]
    fn test_unreadable_timestamps_always_served() {
        let provider = MockProvider::builder(Series::Weather)
            .sample(weather_sample("garbage!!!", 1.0))
            .build();

        let window = FetchWindow::new(date!(2030 - 01 - 01), date!(2030 - 01 - 02));
        assert_eq!(provider.fetch(&window).unwrap().len(), 1);
    }

    #[test]
    fn test_failure_injection() {
        let provider = MockProvider::builder(Series::AirPollution)
            .sample(air_sample(datetime!(2021-01-01 12:00 UTC), 1))
            .fail_on(date!(2021 - 01 - 02))
            .build();

        let ok = FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 02));
        let bad = FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 03));
        assert!(provider.fetch(&ok).is_ok());
        let err = provider.fetch(&bad).unwrap_err();
        assert!(err.is_provider_failure());
        assert_eq!(provider.request_count(), 2);
        assert_eq!(provider.requested_windows(), vec![ok, bad]);

        let always = MockProvider::builder(Series::AirPollution)
            .fail_always()
            .build();
        assert!(always.fetch(&ok).is_err());
    }

    #[test]
    fn test_set_samples() {
        let mut provider = MockProvider::new(Series::AirPollution);
        let day = FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 02));
        assert!(provider.fetch(&day).unwrap().is_empty());

        provider.set_samples(vec![air_sample(datetime!(2021-01-01 12:00 UTC), 1)]);
        assert_eq!(provider.fetch(&day).unwrap().len(), 1);
    }
}
