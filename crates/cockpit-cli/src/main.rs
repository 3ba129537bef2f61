//! cockpit-companion - Elite Dangerous cockpit controller daemon
//!
//! Watches the game's status log and forwards ship telemetry to a serial
//! controller. Run `configure` once to pick the controller and log folder,
//! then `run` (or `debug` for verbose console logging).

#![cfg_attr(not(test), deny(clippy::unwrap_used))]

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cockpit_core::Config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cockpit-companion")]
#[command(about = "Forward Elite Dangerous ship status to a serial cockpit controller")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to config.json next to the executable)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactively choose the controller and log folder
    Configure,

    /// List serial ports and their device identifiers
    Ports {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Run the companion until stopped
    Run,

    /// Run the companion with debug logging
    Debug,
}

impl Commands {
    /// Log filter applied when `RUST_LOG` is not set.
    fn default_log_level(&self) -> &'static str {
        match self {
            Commands::Debug => "debug",
            _ => "info",
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.command {
        Commands::Debug => EnvFilter::new(cli.command.default_log_level()),
        _ => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(cli.command.default_log_level())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path().context("Couldn't find executable path")?,
    };

    match cli.command {
        Commands::Configure => commands::configure::execute(&config_path),
        Commands::Ports { json } => commands::ports::execute(json),
        Commands::Run | Commands::Debug => commands::run::execute(&config_path).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_run_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["cockpit-companion", "run"])?;
        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.command.default_log_level(), "info");
        Ok(())
    }

    #[test]
    fn parse_debug_forces_debug_level() -> TestResult {
        let cli = Cli::try_parse_from(["cockpit-companion", "debug"])?;
        assert_eq!(cli.command.default_log_level(), "debug");
        Ok(())
    }

    #[test]
    fn parse_global_config_after_subcommand() -> TestResult {
        let cli = Cli::try_parse_from(["cockpit-companion", "run", "--config", "/etc/cockpit.json"])?;
        assert_eq!(cli.config, Some(PathBuf::from("/etc/cockpit.json")));
        Ok(())
    }

    #[test]
    fn parse_ports_json() -> TestResult {
        let cli = Cli::try_parse_from(["cockpit-companion", "ports", "--json"])?;
        assert!(matches!(cli.command, Commands::Ports { json: true }));
        Ok(())
    }

    #[test]
    fn parse_requires_command() {
        assert!(Cli::try_parse_from(["cockpit-companion"]).is_err());
        assert!(Cli::try_parse_from(["cockpit-companion", "install"]).is_err());
    }
}
