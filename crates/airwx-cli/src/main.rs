//! `airwx` - incremental weather and air-quality history ingestion.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ingest` | Fetch the next window of a series into the database |
//! | `report` | Joined weather / air-pollution averages as TSV |
//! | `cursor` | Show, set or clear the resume cursor |
//! | `records` | List stored records |
//! | `config` | Manage the configuration file |
//! | `completions` | Generate shell completions |

mod cli;
mod commands;
mod config;
mod util;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::{
    IngestArgs, RecordsArgs, cmd_config, cmd_cursor, cmd_ingest, cmd_records, cmd_report,
};
use crate::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "airwx", &mut io::stdout());
        return Ok(());
    }

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so reports on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    if let Commands::Config { action } = cli.command {
        return cmd_config(action, &config_path);
    }

    let config = Config::load(&config_path)?;
    let database = config.database_path(cli.database.as_deref());

    match cli.command {
        Commands::Ingest {
            series,
            batch_days,
            plan,
        } => cmd_ingest(
            IngestArgs {
                series,
                batch_days,
                plan,
                database,
                quiet: cli.quiet,
            },
            &config,
        ),
        Commands::Report {
            output,
            weather_metric,
            pollution_metric,
        } => cmd_report(
            &database,
            output.as_deref(),
            weather_metric,
            pollution_metric,
            cli.quiet,
        ),
        Commands::Cursor { action } => cmd_cursor(action, &database, &config),
        Commands::Records {
            series,
            since,
            until,
            limit,
            offset,
            oldest_first,
            no_sentinels,
            format,
        } => cmd_records(
            RecordsArgs {
                series,
                since,
                until,
                limit,
                offset,
                oldest_first,
                no_sentinels,
                format,
            },
            &database,
        ),
        Commands::Config { .. } | Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }
}
