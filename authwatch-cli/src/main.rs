//! authwatch -- authentication log intrusion detection CLI
//!
//! # Commands
//!
//! - `analyze`: one-shot two-pass analysis of a complete log file
//! - `watch`: follow a growing log file until Ctrl-C
//! - `config`: validate or display the effective configuration

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;

use clap::Parser;

use authwatch_core::config::{AuthwatchConfig, GeneralConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let use_defaults = cli.uses_default_config();
    let config_path = cli.config_path();

    match cli.command {
        // `config validate` reports load failures itself
        Commands::Config(args) => {
            let mut general = GeneralConfig::default();
            if let Some(level) = cli.log_level {
                general.log_level = level;
            }
            logging::init_tracing(&general)?;
            commands::config::execute(args, &config_path, use_defaults, &writer).await
        }
        Commands::Analyze(args) => {
            let config = load_config(&config_path, use_defaults, cli.log_level).await?;
            commands::analyze::execute(args, &config, &writer).await
        }
        Commands::Watch(args) => {
            let config = load_config(&config_path, use_defaults, cli.log_level).await?;
            commands::watch::execute(args, &config, &writer).await
        }
    }
}

/// Load the configuration and initialise logging from its `[general]` section.
async fn load_config(
    path: &Path,
    use_defaults: bool,
    log_level: Option<String>,
) -> Result<AuthwatchConfig, CliError> {
    let mut config = if use_defaults {
        AuthwatchConfig::load_or_default(path).await?
    } else {
        AuthwatchConfig::load(path).await?
    };
    if let Some(level) = log_level {
        config.general.log_level = level;
    }
    logging::init_tracing(&config.general)?;
    authwatch_core::metrics::describe_metrics();
    Ok(config)
}
