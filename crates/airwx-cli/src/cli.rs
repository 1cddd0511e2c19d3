//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use time::Date;

use airwx_types::{PollutionMetric, Series, WeatherMetric, parse_date};

/// Output format for stored records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RecordFormat {
    #[default]
    Text,
    Json,
    Tsv,
}

#[derive(Debug, Parser)]
#[command(name = "airwx")]
#[command(
    author,
    version,
    about = "Incremental weather and air-quality history ingestion",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "AIRWX_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides the configured one)
    #[arg(long, global = true, env = "AIRWX_DATABASE")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch the next batch of days for a series and store it
    Ingest {
        /// Series to ingest (air-pollution, weather)
        #[arg(value_parser = parse_series)]
        series: Series,

        /// Days per run (overrides the configured batch size)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        batch_days: Option<u32>,

        /// Print the resolved cursor and window without fetching anything
        #[arg(long)]
        plan: bool,
    },

    /// Write the joined weather / air-pollution report as TSV
    Report {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Weather column to average (mintemp, maxtemp, avgtemp, totalsnow, sunhour, uv_index)
        #[arg(long, value_parser = parse_weather_metric, default_value = "avgtemp")]
        weather_metric: WeatherMetric,

        /// Air-pollution column to average (aqi, co, no, no2, o3, so2, pm2_5, pm10, nh3)
        #[arg(long, value_parser = parse_pollution_metric, default_value = "aqi")]
        pollution_metric: PollutionMetric,
    },

    /// Inspect or move the resume cursor
    Cursor {
        #[command(subcommand)]
        action: CursorAction,
    },

    /// List stored records of a series
    Records {
        /// Series to list
        #[arg(value_parser = parse_series)]
        series: Series,

        /// Only records on or after this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        since: Option<Date>,

        /// Only records on or before this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        until: Option<Date>,

        /// Maximum number of records
        #[arg(short = 'n', long)]
        limit: Option<u32>,

        /// Skip this many records
        #[arg(long)]
        offset: Option<u32>,

        /// List oldest records first
        #[arg(long)]
        oldest_first: bool,

        /// Hide all-null placeholder records
        #[arg(long)]
        no_sentinels: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: RecordFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Cursor subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum CursorAction {
    /// Show the next date to fetch (all series if none given)
    Show {
        #[arg(value_parser = parse_series)]
        series: Option<Series>,
    },

    /// Persist a new next date to fetch
    Set {
        #[arg(value_parser = parse_series)]
        series: Series,

        /// Next date to fetch (YYYY-MM-DD)
        #[arg(value_parser = parse_date_arg)]
        date: Date,
    },

    /// Forget the persisted cursor so the next run starts at the epoch
    #[command(alias = "rm")]
    Clear {
        #[arg(value_parser = parse_series)]
        series: Series,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show configuration file path
    Path,

    /// Show current configuration
    Show,

    /// Initialize default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_series(s: &str) -> Result<Series, String> {
    s.parse()
        .map_err(|_| format!("Invalid series '{}'. Valid values: air-pollution, weather", s))
}

fn parse_weather_metric(s: &str) -> Result<WeatherMetric, String> {
    s.parse().map_err(|e: airwx_types::ParseError| e.to_string())
}

fn parse_pollution_metric(s: &str) -> Result<PollutionMetric, String> {
    s.parse().map_err(|e: airwx_types::ParseError| e.to_string())
}

/// Parse a `YYYY-MM-DD` date argument
fn parse_date_arg(s: &str) -> Result<Date, String> {
    parse_date(s).map_err(|_| format!("Invalid date '{}'. Expected YYYY-MM-DD", s))
}
