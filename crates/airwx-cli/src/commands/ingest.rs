//! Ingest command - fetch the next window of a series and store it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use airwx_core::{Ingestor, OpenWeatherAirPollution, Provider, WeatherstackHistorical};
use airwx_types::{Series, format_date};

use crate::config::{Config, OWM_API_KEY_ENV, WEATHERSTACK_API_KEY_ENV, describe_cursor_source};
use crate::util::open_store;

/// Arguments for the ingest command.
pub struct IngestArgs {
    pub series: Series,
    pub batch_days: Option<u32>,
    pub plan: bool,
    pub database: PathBuf,
    pub quiet: bool,
}

/// Execute the ingest command.
pub fn cmd_ingest(args: IngestArgs, config: &Config) -> Result<()> {
    let mut options = config.ingest_options(args.series)?;
    if let Some(days) = args.batch_days {
        options = options.batch_days(days);
    }
    let chunk_days = options.chunk_days;
    let cursor_source = describe_cursor_source(&options.cursor);
    let ingestor = Ingestor::new(options);

    let mut store = open_store(&args.database)?;

    if args.plan {
        let window = ingestor.plan(&store, args.series);
        println!("Series:      {}", args.series);
        println!("Cursor from: {}", cursor_source);
        println!("Next date:   {}", format_date(window.start));
        println!("Window:      {} ({} days)", window, window.days());
        println!("Requests:    {}", window.chunks(chunk_days).len());
        return Ok(());
    }

    let provider = build_provider(args.series, config)?;
    info!("Using {} for {}", provider.name(), args.series);

    let report = ingestor
        .run(&mut store, provider.as_ref())
        .with_context(|| format!("Ingestion of {} failed", args.series))?;

    if !args.quiet {
        let stats = &report.stats;
        println!("Ingested {} window {}", report.series, report.window);
        println!("New records:    {}", stats.inserted);
        println!("Placeholders:   {}", stats.sentinels);
        println!("Already stored: {}", stats.skipped);
        println!("Dropped:        {}", stats.dropped);
        println!(
            "Requests:       {} ({} failed)",
            stats.requests, stats.failed_requests
        );
        println!("Next cursor:    {}", format_date(report.next_cursor));
    }

    Ok(())
}

/// Build the HTTP client for `series` from configuration.
fn build_provider(series: Series, config: &Config) -> Result<Box<dyn Provider>> {
    match series {
        Series::AirPollution => {
            let section = &config.air_pollution;
            let api_key = section.api_key.clone().with_context(|| {
                format!(
                    "No OpenWeather API key configured. Set [air_pollution].api_key or {}",
                    OWM_API_KEY_ENV
                )
            })?;
            let mut client = OpenWeatherAirPollution::new(api_key, section.coordinates())?;
            if let Some(url) = &section.base_url {
                client = client.with_base_url(url.clone());
            }
            Ok(Box::new(client))
        }
        Series::Weather => {
            let section = &config.weather;
            let api_key = section.api_key.clone().with_context(|| {
                format!(
                    "No Weatherstack API key configured. Set [weather].api_key or {}",
                    WEATHERSTACK_API_KEY_ENV
                )
            })?;
            let mut client = WeatherstackHistorical::new(api_key, section.location.clone())?;
            if let Some(url) = &section.base_url {
                client = client.with_base_url(url.clone());
            }
            Ok(Box::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_requires_api_key() {
        let config = Config::default();
        let err = build_provider(Series::Weather, &config).err().unwrap();
        assert!(err.to_string().contains(WEATHERSTACK_API_KEY_ENV));
    }

    #[test]
    fn test_build_provider_matches_series() {
        let mut config = Config::default();
        config.apply_api_keys(Some("owm".to_string()), Some("ws".to_string()));

        let air = build_provider(Series::AirPollution, &config).unwrap();
        assert_eq!(air.series(), Series::AirPollution);
        assert_eq!(air.name(), "OpenWeather");

        let weather = build_provider(Series::Weather, &config).unwrap();
        assert_eq!(weather.series(), Series::Weather);
    }

    #[test]
    fn test_plan_does_not_need_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let args = IngestArgs {
            series: Series::AirPollution,
            batch_days: Some(3),
            plan: true,
            database: dir.path().join("data.db"),
            quiet: true,
        };
        cmd_ingest(args, &Config::default()).unwrap();
    }
}
