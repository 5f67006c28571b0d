//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "authwatch.toml";

/// authwatch -- authentication log intrusion detection.
///
/// Use `authwatch <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "authwatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file [default: authwatch.toml].
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether `--config` was omitted.
    ///
    /// A missing file at the default path falls back to built-in defaults;
    /// a missing file named explicitly is an error, even if it is named
    /// `authwatch.toml`.
    pub fn uses_default_config(&self) -> bool {
        self.config.is_none()
    }

    /// Configuration path to load.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyse a complete log file once and write the alert log and report.
    Analyze(AnalyzeArgs),

    /// Follow a growing log file and alert as lines arrive.
    Watch(WatchArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- analyze ----

/// Batch analysis of a finished log file.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Log file to analyse (default: `monitor.log_path`).
    pub log: Option<PathBuf>,

    /// Override the alert log destination.
    #[arg(long)]
    pub alerts: Option<PathBuf>,

    /// Override the report destination.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the report without writing any file.
    #[arg(long)]
    pub no_persist: bool,
}

// ---- watch ----

/// Continuous monitoring of a growing log file.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Log file to follow (default: `monitor.log_path`).
    pub log: Option<PathBuf>,

    /// Replay the existing file content before following it.
    #[arg(long, conflicts_with = "tail_only")]
    pub from_start: bool,

    /// Skip existing content and only process new lines.
    #[arg(long)]
    pub tail_only: bool,

    /// Poll interval in seconds.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Regenerate the report every N seconds (0 = only on shutdown).
    #[arg(long)]
    pub report_interval: Option<u64>,
}

// ---- config ----

/// Manage authwatch configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, detection, monitor).
        #[arg(long)]
        section: Option<String>,
    },
}
