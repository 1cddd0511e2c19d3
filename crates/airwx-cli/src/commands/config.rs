//! Config command - manage the configuration file.

use std::path::Path;

use anyhow::{Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;

const MASK: &str = "********";

/// Execute the config command.
pub fn cmd_config(action: ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let config = Config::load(path)?;
            if !path.exists() {
                println!("# {} does not exist, showing defaults", path.display());
            }
            print!("{}", masked(config).to_toml()?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Config::default().save(path)?;
            println!("Created config file at {}", path.display());
        }
    }
    Ok(())
}

/// Hide API keys before printing.
fn masked(mut config: Config) -> Config {
    if config.air_pollution.api_key.is_some() {
        config.air_pollution.api_key = Some(MASK.to_string());
    }
    if config.weather.api_key.is_some() {
        config.weather.api_key = Some(MASK.to_string());
    }
    config
}
