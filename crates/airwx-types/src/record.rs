//! Measurement records and the raw samples providers hand back.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalKey;
use crate::types::Series;

/// Air-quality sample: pollutant concentrations in µg/m³ and the
/// provider's air-quality index (1 = good .. 5 = very poor).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AirQuality {
    pub aqi: Option<i64>,
    pub co: Option<f64>,
    pub no: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub nh3: Option<f64>,
}

impl AirQuality {
    /// True when every field is null.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Daily weather summary with its astronomy data.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DailyWeather {
    /// Minimum temperature in °C.
    pub mintemp: Option<f64>,
    /// Maximum temperature in °C.
    pub maxtemp: Option<f64>,
    /// Average temperature in °C.
    pub avgtemp: Option<f64>,
    /// Total snowfall in cm.
    pub totalsnow: Option<f64>,
    /// Hours of sunshine.
    pub sunhour: Option<f64>,
    pub uv_index: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub moonrise: Option<String>,
    pub moonset: Option<String>,
    pub moon_phase: Option<String>,
    /// Moon illumination percentage.
    pub moon_illumination: Option<i64>,
}

impl DailyWeather {
    /// True when every field is null.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Measurement fields of one record, typed by series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "series", rename_all = "kebab-case"))]
pub enum MeasurementFields {
    AirPollution(AirQuality),
    Weather(DailyWeather),
}

impl MeasurementFields {
    /// All-null fields for a series.
    #[must_use]
    pub fn empty(series: Series) -> Self {
        match series {
            Series::AirPollution => MeasurementFields::AirPollution(AirQuality::default()),
            Series::Weather => MeasurementFields::Weather(DailyWeather::default()),
        }
    }

    /// The series these fields belong to.
    #[must_use]
    pub fn series(&self) -> Series {
        match self {
            MeasurementFields::AirPollution(_) => Series::AirPollution,
            MeasurementFields::Weather(_) => Series::Weather,
        }
    }

    /// True when every measurement field is null.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            MeasurementFields::AirPollution(fields) => fields.is_empty(),
            MeasurementFields::Weather(fields) => fields.is_empty(),
        }
    }
}

/// One stored row: a canonical key plus its measurement fields.
///
/// A record whose fields are all null is a *sentinel*: it marks a slot for
/// which the provider had no data, so a daily series has no gaps.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementRecord {
    /// Canonical timestamp (unique per series).
    pub key: CanonicalKey,
    /// Measurement values.
    pub fields: MeasurementFields,
}

impl MeasurementRecord {
    /// Create a record.
    #[must_use]
    pub fn new(key: CanonicalKey, fields: MeasurementFields) -> Self {
        Self { key, fields }
    }

    /// Create a sentinel "no measurement" record.
    #[must_use]
    pub fn sentinel(series: Series, key: CanonicalKey) -> Self {
        Self {
            key,
            fields: MeasurementFields::empty(series),
        }
    }

    /// True when all measurement fields are null.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.fields.is_empty()
    }

    /// Series of the record.
    #[must_use]
    pub fn series(&self) -> Series {
        self.fields.series()
    }
}

/// Timestamp exactly as a provider reported it, before canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RawTimestamp {
    /// UNIX seconds.
    Epoch(i64),
    /// `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS` (UTC).
    Text(String),
}

/// One entry of a provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub timestamp: RawTimestamp,
    pub fields: MeasurementFields,
}

impl RawSample {
    /// Create a sample.
    #[must_use]
    pub fn new(timestamp: RawTimestamp, fields: MeasurementFields) -> Self {
        Self { timestamp, fields }
    }
}
