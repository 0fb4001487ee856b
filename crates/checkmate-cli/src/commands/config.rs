use clap::Subcommand;
use checkmate_core::{Config, ConfigError};

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value
    Get {
        /// Dot-separated key (e.g. "timer.default_focus_minutes", "badge.break_color")
        key: String,
    },
    /// Change one value; focus lengths must stay within the custom bounds
    Set {
        /// Dot-separated key
        key: String,
        /// New value; tables and lists take JSON
        value: String,
    },
    /// Show the whole configuration
    List {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// Print where the configuration file lives
    Path,
    /// Restore the defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            tracing::info!(%key, "config updated");
            let stored = config.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("restored defaults in {}", Config::path()?.display());
        }
    }
    Ok(())
}
