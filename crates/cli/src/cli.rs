//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sensor Monitor - liveness and validity tracking for robot sensors
#[derive(Parser, Debug)]
#[command(
    name = "sensor-monitor",
    author,
    version,
    about = "Sensor liveness and validity monitor",
    long_about = "Tracks whether each configured sensor delivers fresh, valid data.\n\n\
                  Loads sensors from configuration, applies measurements read as \n\
                  JSON lines and reports reading, activity and diagnostics per sensor."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SENSOR_MONITOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SENSOR_MONITOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Replay recorded measurements against a simulated clock
    Replay(ReplayArgs),

    /// Monitor live measurements on the wall clock
    Monitor(MonitorArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "monitor.toml", env = "SENSOR_MONITOR_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "monitor.toml", env = "SENSOR_MONITOR_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `replay` command
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "monitor.toml", env = "SENSOR_MONITOR_CONFIG")]
    pub config: PathBuf,

    /// Measurements, one JSON object per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Seconds past the last measurement at which the final snapshot is taken
    #[arg(long, default_value = "0")]
    pub settle: f64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `monitor` command
#[derive(Parser, Debug, Clone)]
pub struct MonitorArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "monitor.toml", env = "SENSOR_MONITOR_CONFIG")]
    pub config: PathBuf,

    /// Measurements, one JSON object per line ("-" or omitted = stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "SENSOR_MONITOR_METRICS_PORT")]
    pub metrics_port: u16,

    /// Status polling period in milliseconds
    #[arg(long, default_value = "500", env = "SENSOR_MONITOR_STATUS_PERIOD_MS")]
    pub status_period_ms: u64,

    /// Channel buffer size between the reader and the sensors
    #[arg(long, default_value = "256", env = "SENSOR_MONITOR_BUFFER_SIZE")]
    pub buffer_size: usize,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
