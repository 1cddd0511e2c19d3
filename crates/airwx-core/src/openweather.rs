//! OpenWeather air pollution history client.
//!
//! `GET {base}/data/2.5/air_pollution/history?lat&lon&start&end&appid`, with
//! `start` and `end` as UNIX seconds at UTC midnight. The response holds an
//! hourly `list` of entries:
//!
//! ```json
//! {"list": [{"dt": 1609502400, "main": {"aqi": 2},
//!            "components": {"co": 250.34, "no2": 12.5, "pm2_5": 4.2}}]}
//! ```

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use airwx_types::{
    AirQuality, Coordinates, FetchWindow, MeasurementFields, RawSample, RawTimestamp, Series,
};

use crate::error::{Error, Result};
use crate::traits::Provider;

/// Production endpoint.
pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";

/// Default HTTP timeout for one request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "OpenWeather";

/// Blocking client for hourly air-quality history at one location.
#[derive(Debug, Clone)]
pub struct OpenWeatherAirPollution {
    client: Client,
    base_url: String,
    api_key: String,
    location: Coordinates,
}

impl OpenWeatherAirPollution {
    /// Create a client for `location` against the production endpoint.
    pub fn new(api_key: impl Into<String>, location: Coordinates) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::request(PROVIDER, e))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            location,
        })
    }

    /// Use another endpoint, e.g. a local test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Location the client requests data for.
    pub fn location(&self) -> Coordinates {
        self.location
    }

    fn url(&self) -> String {
        format!(
            "{}/data/2.5/air_pollution/history",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl Provider for OpenWeatherAirPollution {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn series(&self) -> Series {
        Series::AirPollution
    }

    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawSample>> {
        debug!("Requesting air pollution history for {}", window);

        let response = self
            .client
            .get(self.url())
            .query(&[
                ("lat", self.location.latitude.to_string()),
                ("lon", self.location.longitude.to_string()),
                ("start", window.start_timestamp().to_string()),
                ("end", window.end_timestamp().to_string()),
                ("appid", self.api_key.clone()),
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
struct HistoryResponse {
    #[serde(default)]
    list: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    dt: i64,
    #[serde(default)]
    main: Option<IndexValue>,
    #[serde(default)]
    components: Components,
}

#[derive(Debug, Deserialize)]
struct IndexValue {
    aqi: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Components {
    co: Option<f64>,
    no: Option<f64>,
    no2: Option<f64>,
    o3: Option<f64>,
    so2: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    nh3: Option<f64>,
}

/// Decode a history response body into raw samples, in response order.
pub fn parse_response(body: &str) -> Result<Vec<RawSample>> {
    let response: HistoryResponse = serde_json::from_str(body).map_err(|e| Error::Decode {
        provider: PROVIDER,
        message: e.to_string(),
    })?;

    Ok(response
        .list
        .into_iter()
        .map(|entry| {
            let c = entry.components;
            RawSample::new(
                RawTimestamp::Epoch(entry.dt),
                MeasurementFields::AirPollution(AirQuality {
                    aqi: entry.main.and_then(|m| m.aqi),
                    co: c.co,
                    no: c.no,
                    no2: c.no2,
                    o3: c.o3,
                    so2: c.so2,
                    pm2_5: c.pm2_5,
                    pm10: c.pm10,
                    nh3: c.nh3,
                }),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../tests/fixtures/openweather_air_pollution.json");

    #[test]
    fn test_parse_fixture() {
        let samples = parse_response(FIXTURE).unwrap();
        assert_eq!(samples.len(), 3);

        // 2021-01-01 12:00:00 UTC
        assert_eq!(samples[1].timestamp, RawTimestamp::Epoch(1_609_502_400));
        match &samples[1].fields {
            MeasurementFields::AirPollution(aq) => {
                assert_eq!(aq.aqi, Some(2));
                assert_eq!(aq.co, Some(250.34));
                assert_eq!(aq.pm2_5, Some(4.2));
                assert_eq!(aq.nh3, Some(0.9));
            }
            MeasurementFields::Weather(_) => panic!("wrong series"),
        }
    }

    #[test]
    fn test_missing_components_are_null() {
        let samples = parse_response(r#"{"list": [{"dt": 1609502400}]}"#).unwrap();
        assert_eq!(samples.len(), 1);
        assert!(samples[0].fields.is_empty());
    }

    #[test]
    fn test_empty_and_missing_list() {
        assert!(parse_response(r#"{"coord": {"lon": -83.0458, "lat": 42.3314}, "list": []}"#)
            .unwrap()
            .is_empty());
        assert!(parse_response("{}").unwrap().is_empty());
    }

    #[test]
    fn test_undecodable_body() {
        let err = parse_response("<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.is_provider_failure());
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = OpenWeatherAirPollution::new("key", Coordinates::new(42.3314, -83.0458))
            .unwrap()
            .with_base_url("http://localhost:9999/");
        assert_eq!(
            client.url(),
            "http://localhost:9999/data/2.5/air_pollution/history"
        );
        assert_eq!(client.series(), Series::AirPollution);
    }
}
