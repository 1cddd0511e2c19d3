//! Weatherstack historical weather client.
//!
//! `GET {base}/historical?access_key&query&historical_date_start&historical_date_end`
//! with inclusive ISO dates. The `historical` object of the response is keyed
//! by `YYYY-MM-DD`; each entry is a daily summary with an `astro` section.
//! Weatherstack reports API errors with a success status and a `success:
//! false` body.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use airwx_types::{
    DailyWeather, FetchWindow, MeasurementFields, RawSample, RawTimestamp, Series, format_date,
};

use crate::error::{Error, Result};
use crate::traits::Provider;

/// Production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.weatherstack.com";

/// Default HTTP timeout for one request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const PROVIDER: &str = "Weatherstack";

/// Blocking client for daily historical weather at one named location.
#[derive(Debug, Clone)]
pub struct WeatherstackHistorical {
    client: Client,
    base_url: String,
    access_key: String,
    location: String,
}

impl WeatherstackHistorical {
    /// Create a client for `location` (e.g. `"Detroit, United States"`).
    pub fn new(access_key: impl Into<String>, location: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::request(PROVIDER, e))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            access_key: access_key.into(),
            location: location.into(),
        })
    }

    /// Use another endpoint, e.g. a local test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Location query sent with every request.
    pub fn location(&self) -> &str {
        &self.location
    }

    fn url(&self) -> String {
        format!("{}/historical", self.base_url.trim_end_matches('/'))
    }
}

impl Provider for WeatherstackHistorical {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn series(&self) -> Series {
        Series::Weather
    }

    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawSample>> {
        let Some(last_day) = window.last_day() else {
            return Ok(Vec::new());
        };

        debug!("Requesting historical weather for {}", window);

        let start = format_date(window.start);
        let end = format_date(last_day);
        let response = self
            .client
            .get(self.url())
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("query", self.location.as_str()),
                ("historical_date_start", start.as_str()),
                ("historical_date_end", end.as_str()),
            ])
            .send()
            .map_err(|e| Error::request(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|e| Error::request(PROVIDER, e))?;
        parse_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct HistoricalResponse {
    success: Option<bool>,
    error: Option<ApiError>,
    historical: Option<HistoricalDays>,
}

/// The `historical` object as `(date, day)` pairs in document order.
///
/// Repeated dates are all kept; the ingest loop decides which one wins.
#[derive(Debug, Default)]
struct HistoricalDays(Vec<(String, HistoricalDay)>);

impl<'de> Deserialize<'de> for HistoricalDays {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DaysVisitor;

        impl<'de> Visitor<'de> for DaysVisitor {
            type Value = HistoricalDays;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by date")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut days = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, HistoricalDay>()? {
                    days.push(entry);
                }
                Ok(HistoricalDays(days))
            }
        }

        deserializer.deserialize_map(DaysVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<i64>,
    info: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoricalDay {
    mintemp: Option<f64>,
    maxtemp: Option<f64>,
    avgtemp: Option<f64>,
    totalsnow: Option<f64>,
    sunhour: Option<f64>,
    uv_index: Option<f64>,
    astro: Option<Astro>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Astro {
    sunrise: Option<String>,
    sunset: Option<String>,
    moonrise: Option<String>,
    moonset: Option<String>,
    moon_phase: Option<String>,
    moon_illumination: Option<i64>,
}

/// Decode a historical response body into raw samples, in response order.
///
/// A body without a `historical` section means no data for the window.
pub fn parse_response(body: &str) -> Result<Vec<RawSample>> {
    let response: HistoricalResponse = serde_json::from_str(body).map_err(|e| Error::Decode {
        provider: PROVIDER,
        message: e.to_string(),
    })?;

    if response.success == Some(false) || response.error.is_some() {
        let message = match response.error {
            Some(ApiError {
                code: Some(code),
                info: Some(info),
            }) => format!("{} (code {})", info, code),
            Some(ApiError {
                info: Some(info), ..
            }) => info,
            _ => "request was not successful".to_string(),
        };
        return Err(Error::Api {
            provider: PROVIDER,
            message,
        });
    }

    let Some(historical) = response.historical else {
        warn!("No historical data found in {} response", PROVIDER);
        return Ok(Vec::new());
    };

    Ok(historical
        .0
        .into_iter()
        .map(|(date, day)| {
            let astro = day.astro.unwrap_or_default();
            RawSample::new(
                RawTimestamp::Text(date),
                MeasurementFields::Weather(DailyWeather {
                    mintemp: day.mintemp,
                    maxtemp: day.maxtemp,
                    avgtemp: day.avgtemp,
                    totalsnow: day.totalsnow,
                    sunhour: day.sunhour,
                    uv_index: day.uv_index,
                    sunrise: astro.sunrise,
                    sunset: astro.sunset,
                    moonrise: astro.moonrise,
                    moonset: astro.moonset,
                    moon_phase: astro.moon_phase,
                    moon_illumination: astro.moon_illumination,
                }),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../tests/fixtures/weatherstack_historical.json");
    const ERROR_FIXTURE: &str = include_str!("../tests/fixtures/weatherstack_error.json");

    #[test]
    fn test_parse_fixture() {
        let samples = parse_response(FIXTURE).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[0].timestamp,
            RawTimestamp::Text("2021-01-01".to_string())
        );

        match &samples[0].fields {
            MeasurementFields::Weather(day) => {
                assert_eq!(day.mintemp, Some(-3.0));
                assert_eq!(day.avgtemp, Some(-1.0));
                assert_eq!(day.totalsnow, Some(0.4));
                assert_eq!(day.sunrise.as_deref(), Some("08:02 AM"));
                assert_eq!(day.moon_phase.as_deref(), Some("Waning Gibbous"));
                assert_eq!(day.moon_illumination, Some(91));
            }
            MeasurementFields::AirPollution(_) => panic!("wrong series"),
        }
    }

    #[test]
    fn test_missing_historical_is_empty() {
        let body = r#"{"request": {"type": "City"}, "current": {"temperature": 4}}"#;
        assert!(parse_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_api_error() {
        let err = parse_response(ERROR_FIXTURE).unwrap_err();
        match &err {
            Error::Api { message, .. } => {
                assert!(message.contains("does not support historical"));
                assert!(message.contains("603"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_provider_failure());
    }

    #[test]
    fn test_day_without_astro() {
        let body = r#"{"historical": {"2021-02-01": {"avgtemp": -7}}}"#;
        let samples = parse_response(body).unwrap();
        match &samples[0].fields {
            MeasurementFields::Weather(day) => {
                assert_eq!(day.avgtemp, Some(-7.0));
                assert!(day.sunrise.is_none());
            }
            MeasurementFields::AirPollution(_) => panic!("wrong series"),
        }
    }

    #[test]
    fn test_days_keep_response_order_and_duplicates() {
        let body = r#"{"historical": {
            "2021-01-03": {"avgtemp": 3},
            "2021-01-01": {"avgtemp": 1},
            "2021-01-03": {"avgtemp": 30}
        }}"#;
        let samples = parse_response(body).unwrap();

        let dates: Vec<_> = samples
            .iter()
            .map(|s| match &s.timestamp {
                RawTimestamp::Text(date) => date.as_str(),
                RawTimestamp::Epoch(_) => panic!("weather dates are text"),
            })
            .collect();
        assert_eq!(dates, ["2021-01-03", "2021-01-01", "2021-01-03"]);

        match &samples[0].fields {
            MeasurementFields::Weather(day) => assert_eq!(day.avgtemp, Some(3.0)),
            MeasurementFields::AirPollution(_) => panic!("wrong series"),
        }
    }

    #[test]
    fn test_empty_window_makes_no_request() {
        let client = WeatherstackHistorical::new("key", "Detroit, United States")
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let window = FetchWindow::new(
            time::macros::date!(2021 - 01 - 01),
            time::macros::date!(2021 - 01 - 01),
        );
        assert!(client.fetch(&window).unwrap().is_empty());
        assert_eq!(client.url(), "http://127.0.0.1:1/historical");
    }
}
