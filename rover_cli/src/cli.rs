//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Command-source override for `run`; mirrors `transport.authority` in the
/// config.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AuthorityArg {
    /// Host computer over the primary serial port
    Serial,
    /// Secondary short-range wireless path (single-letter vocabulary)
    Wireless,
}

#[derive(Parser, Debug)]
#[command(name = "rover", version, about = "Rover motion controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/rover_config.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop against the configured transport
    Run {
        /// Override the serial device from the config
        #[arg(long, value_name = "DEV")]
        port: Option<String>,
        /// Log intended actuation without touching GPIO
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
        /// Override the authoritative command source
        #[arg(long, value_enum, value_name = "SOURCE")]
        authority: Option<AuthorityArg>,
    },
    /// Quick health check (config parses, hardware assembles)
    SelfCheck,
}
