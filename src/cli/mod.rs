//! Command-line interface definitions.

pub mod check;
pub mod discover;
pub mod fetch;
pub mod output;
pub mod post;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::domain::{DataType, RequestParams};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// tallybridge - talk to a TallyPrime HTTP-XML gateway.
#[derive(Parser, Debug)]
#[command(name = "tallybridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Override log level (debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),

    /// Find gateway instances on common hosts and ports
    Discover(ConfigPathArg),

    /// Fetch one data type and print it as JSON
    Fetch(FetchArgs),

    /// Import a voucher from an XML file
    Post(PostArgs),
}

/// Subcommands for `tallybridge check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config(ConfigPathArg),
    /// Probe the configured gateway
    Connection(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `fetch` subcommand.
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Data type, e.g. company_info, ledger_list, ledger_names
    #[arg(value_parser = parse_data_type)]
    pub data_type: DataType,

    /// Request parameter as key=value (repeatable)
    #[arg(short, long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Bypass the response cache
    #[arg(long)]
    pub refresh: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

impl FetchArgs {
    #[must_use]
    pub fn request_params(&self) -> RequestParams {
        self.params.iter().cloned().collect()
    }
}

/// Arguments for the `post` subcommand.
#[derive(Parser, Debug)]
pub struct PostArgs {
    /// File holding the VOUCHER element
    pub file: PathBuf,

    /// Only run the local validation
    #[arg(long)]
    pub validate_only: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

fn parse_data_type(value: &str) -> std::result::Result<DataType, String> {
    DataType::from_name(value).ok_or_else(|| {
        let known: Vec<&str> = DataType::ALL.iter().map(|dt| dt.as_str()).collect();
        format!("unknown data type '{value}', expected one of: {}", known.join(", "))
    })
}

fn parse_param(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{value}'")),
    }
}

/// Load the config file, or defaults plus environment overrides when the
/// file does not exist.
#[allow(clippy::result_large_err)]
pub fn load_config(path: &Path, log_level: Option<&str>) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path)?
    } else {
        let mut config = Config::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        config
    };
    if let Some(level) = log_level {
        config.logging.level = level.to_string();
    }
    config.init_logging();
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_parse_as_key_value() {
        assert_eq!(
            parse_param("ledger_name = Cash"),
            Ok(("ledger_name".to_string(), "Cash".to_string()))
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn data_type_names_are_checked() {
        assert_eq!(parse_data_type("day_book"), Ok(DataType::DayBook));
        let err = parse_data_type("ledgers").unwrap_err();
        assert!(err.contains("ledger_list"));
    }

    #[test]
    fn cli_parses_fetch() {
        let cli = Cli::parse_from([
            "tallybridge",
            "fetch",
            "ledger_details",
            "-p",
            "ledger_name=Cash",
            "--refresh",
        ]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.data_type, DataType::LedgerDetails);
        assert!(args.refresh);
        assert_eq!(args.request_params().get("ledger_name"), Some("Cash"));
    }
}
