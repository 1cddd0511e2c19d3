//! Configuration file management.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::Date;

use airwx_core::{CursorSource, DEFAULT_BATCH_DAYS, IngestOptions, state_file_path};
use airwx_types::{Coordinates, Granularity, Series, parse_date};

/// Environment variable overriding `[air_pollution].api_key`.
pub const OWM_API_KEY_ENV: &str = "AIRWX_OWM_API_KEY";

/// Environment variable overriding `[weather].api_key`.
pub const WEATHERSTACK_API_KEY_ENV: &str = "AIRWX_WEATHERSTACK_API_KEY";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Where the resume cursor is kept
    #[serde(default)]
    pub cursor: CursorKind,

    /// Directory for state files when `cursor = "file"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    /// Pause between provider requests in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// First date fetched when no cursor exists (YYYY-MM-DD)
    #[serde(default = "default_epoch")]
    pub epoch: String,

    #[serde(default)]
    pub air_pollution: AirPollutionConfig,

    #[serde(default)]
    pub weather: WeatherConfig,
}

/// Cursor persistence strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorKind {
    /// `ingest_cursor` row in the database
    #[default]
    Table,
    /// One `<table>_last_processed_date.txt` file per series in `state_dir`
    File,
    /// Day after the newest stored record
    MaxStored,
}

/// `[air_pollution]` section: OpenWeather air pollution history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirPollutionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_batch_days")]
    pub batch_days: u32,

    #[serde(default = "default_hourly_chunk_days")]
    pub chunk_days: u32,

    #[serde(default)]
    pub granularity: Granularity,
}

/// `[weather]` section: Weatherstack historical weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Location query, e.g. "Detroit, United States"
    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_batch_days")]
    pub batch_days: u32,

    #[serde(default = "default_batch_days")]
    pub chunk_days: u32,

    #[serde(default)]
    pub granularity: Granularity,
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_epoch() -> String {
    "2021-01-01".to_string()
}

fn default_latitude() -> f64 {
    42.3314
}

fn default_longitude() -> f64 {
    -83.0458
}

fn default_location() -> String {
    "Detroit, United States".to_string()
}

fn default_batch_days() -> u32 {
    DEFAULT_BATCH_DAYS
}

fn default_hourly_chunk_days() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            cursor: CursorKind::default(),
            state_dir: None,
            request_delay_ms: default_request_delay_ms(),
            epoch: default_epoch(),
            air_pollution: AirPollutionConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl Default for AirPollutionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            latitude: default_latitude(),
            longitude: default_longitude(),
            base_url: None,
            batch_days: default_batch_days(),
            chunk_days: default_hourly_chunk_days(),
            granularity: Granularity::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            location: default_location(),
            base_url: None,
            batch_days: default_batch_days(),
            chunk_days: default_batch_days(),
            granularity: Granularity::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("airwx")
            .join("config.toml")
    }

    /// Load config from `path`, or return defaults if the file does not
    /// exist. API keys from the environment take precedence over the file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_api_keys(
            env::var(OWM_API_KEY_ENV).ok(),
            env::var(WEATHERSTACK_API_KEY_ENV).ok(),
        );
        Ok(config)
    }

    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render config as TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Save config to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Replace API keys with non-empty override values.
    pub fn apply_api_keys(&mut self, owm: Option<String>, weatherstack: Option<String>) {
        if let Some(key) = owm.filter(|k| !k.is_empty()) {
            self.air_pollution.api_key = Some(key);
        }
        if let Some(key) = weatherstack.filter(|k| !k.is_empty()) {
            self.weather.api_key = Some(key);
        }
    }

    /// Database file: command-line override, then config, then the platform default
    pub fn database_path(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.database.clone())
            .unwrap_or_else(airwx_store::default_db_path)
    }

    /// Directory holding cursor state files
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("airwx")
        })
    }

    /// Parsed epoch date
    pub fn epoch_date(&self) -> Result<Date> {
        parse_date(&self.epoch).with_context(|| format!("Invalid epoch '{}'", self.epoch))
    }

    /// Cursor source for `series`
    pub fn cursor_source(&self, series: Series) -> CursorSource {
        match self.cursor {
            CursorKind::Table => CursorSource::Table,
            CursorKind::File => CursorSource::StateFile(state_file_path(&self.state_dir(), series)),
            CursorKind::MaxStored => CursorSource::MaxStored,
        }
    }

    /// Ingestion options for `series`
    pub fn ingest_options(&self, series: Series) -> Result<IngestOptions> {
        let (batch_days, chunk_days, granularity) = match series {
            Series::AirPollution => (
                self.air_pollution.batch_days,
                self.air_pollution.chunk_days,
                self.air_pollution.granularity,
            ),
            Series::Weather => (
                self.weather.batch_days,
                self.weather.chunk_days,
                self.weather.granularity,
            ),
        };

        let mut options = IngestOptions::for_series(series)
            .batch_days(batch_days)
            .chunk_days(chunk_days)
            .granularity(granularity)
            .request_delay(Duration::from_millis(self.request_delay_ms))
            .cursor(self.cursor_source(series))
            .epoch(self.epoch_date()?);
        if series == Series::AirPollution {
            options = options.location(self.air_pollution.coordinates());
        }

        options.validate()?;
        Ok(options)
    }
}

impl AirPollutionConfig {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Short description of where the cursor of `series` lives, for display
pub fn describe_cursor_source(source: &CursorSource) -> String {
    match source {
        CursorSource::StateFile(path) => format!("file {}", path.display()),
        CursorSource::Table => "database table".to_string(),
        CursorSource::MaxStored => "newest stored record".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cursor, CursorKind::Table);
        assert_eq!(config.request_delay_ms, 1000);
        assert_eq!(config.epoch_date().unwrap(), date!(2021 - 01 - 01));
        assert_eq!(config.air_pollution.latitude, 42.3314);
        assert_eq!(config.air_pollution.longitude, -83.0458);
        assert_eq!(config.air_pollution.chunk_days, 1);
        assert_eq!(config.weather.location, "Detroit, United States");
        assert_eq!(config.weather.chunk_days, 25);
        assert_eq!(config.weather.granularity, Granularity::DailyNoon);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml(
            r#"
            cursor = "max-stored"

            [weather]
            api_key = "ws-key"
            granularity = "full"
            "#,
        )
        .unwrap();

        assert_eq!(config.cursor, CursorKind::MaxStored);
        assert_eq!(config.weather.api_key.as_deref(), Some("ws-key"));
        assert_eq!(config.weather.granularity, Granularity::Full);
        assert_eq!(config.weather.batch_days, 25);
        assert_eq!(config.air_pollution, AirPollutionConfig::default());
    }

    #[test]
    fn test_max_stored_with_full_granularity_rejected() {
        let mut config = Config::default();
        config.cursor = CursorKind::MaxStored;
        assert!(config.ingest_options(Series::Weather).is_ok());

        config.weather.granularity = Granularity::Full;
        let err = config.ingest_options(Series::Weather).unwrap_err();
        assert!(format!("{:#}", err).contains("max-stored"));
        assert!(config.ingest_options(Series::AirPollution).is_ok());
    }

    #[test]
    fn test_unknown_cursor_kind_rejected() {
        assert!(Config::from_toml(r#"cursor = "redis""#).is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.database = Some(PathBuf::from("/var/lib/airwx/data.db"));
        config.air_pollution.api_key = Some("owm".to_string());

        let text = config.to_toml().unwrap();
        assert!(text.contains("[air_pollution]"));
        assert!(text.contains("granularity = \"daily-noon\""));
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.request_delay_ms = 0;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.request_delay_ms, 0);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.request_delay_ms, 1000);
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "request_delay_ms = \"soon\"").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_api_key_overrides() {
        let mut config = Config::default();
        config.weather.api_key = Some("from-file".to_string());

        config.apply_api_keys(Some("owm-env".to_string()), Some(String::new()));
        assert_eq!(config.air_pollution.api_key.as_deref(), Some("owm-env"));
        assert_eq!(config.weather.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_database_path_precedence() {
        let mut config = Config::default();
        config.database = Some(PathBuf::from("config.db"));

        assert_eq!(
            config.database_path(Some(Path::new("cli.db"))),
            PathBuf::from("cli.db")
        );
        assert_eq!(config.database_path(None), PathBuf::from("config.db"));
    }

    #[test]
    fn test_cursor_source() {
        let mut config = Config::default();
        assert_eq!(config.cursor_source(Series::Weather), CursorSource::Table);

        config.cursor = CursorKind::File;
        config.state_dir = Some(PathBuf::from("/srv/state"));
        assert_eq!(
            config.cursor_source(Series::AirPollution),
            CursorSource::StateFile(PathBuf::from(
                "/srv/state/air_pollution_last_processed_date.txt"
            ))
        );
    }

    #[test]
    fn test_ingest_options() {
        let mut config = Config::default();
        config.request_delay_ms = 250;
        config.epoch = "2022-06-01".to_string();

        let air = config.ingest_options(Series::AirPollution).unwrap();
        assert_eq!(air.chunk_days, 1);
        assert_eq!(air.request_delay, Duration::from_millis(250));
        assert_eq!(air.epoch, date!(2022 - 06 - 01));
        assert_eq!(air.location, Some(Coordinates::new(42.3314, -83.0458)));

        let weather = config.ingest_options(Series::Weather).unwrap();
        assert_eq!(weather.chunk_days, 25);
        assert_eq!(weather.location, None);
    }

    #[test]
    fn test_ingest_options_rejects_bad_values() {
        let mut config = Config::default();
        config.weather.batch_days = 0;
        assert!(config.ingest_options(Series::Weather).is_err());

        let mut config = Config::default();
        config.epoch = "yesterday".to_string();
        assert!(config.ingest_options(Series::AirPollution).is_err());
    }
}
