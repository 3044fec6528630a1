//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// usnav - tracked ultrasound calibration tools
#[derive(Parser, Debug)]
#[command(
    name = "usnav",
    author,
    version,
    about = "Tracked ultrasound navigation calibration",
    long_about = "Calibration tools for tracked ultrasound systems.\n\n\
                  Loads coordinate frame definitions, resolves chained transforms \n\
                  and estimates the time offset between a pose tracker and an \n\
                  ultrasound video stream."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "USNAV_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "USNAV_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Print recorded Prometheus metrics to stderr on exit
    #[arg(long, global = true, env = "USNAV_PRINT_METRICS")]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file
    Validate(ValidateArgs),

    /// Display configuration and transform graph
    Info(InfoArgs),

    /// Estimate the tracker lag of recorded sequences
    Calibrate(CalibrateArgs),

    /// Query a transform from the coordinate definitions
    Transform(TransformArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "usnav.toml", env = "USNAV_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "usnav.toml", env = "USNAV_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the transform graph adjacency
    #[arg(long)]
    pub graph: bool,
}

/// Arguments for the `calibrate` command
#[derive(Parser, Debug, Clone)]
pub struct CalibrateArgs {
    /// Recorded sequence files (TOML or JSON)
    #[arg(required = true)]
    pub sequences: Vec<PathBuf>,

    /// Path to configuration file (defaults are used when absent)
    #[arg(short, long, env = "USNAV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the sampling resolution (seconds)
    #[arg(long)]
    pub resolution: Option<f64>,

    /// Override the maximum tracker lag searched (seconds)
    #[arg(long)]
    pub max_lag: Option<f64>,

    /// Override the transform driving the tracker metric, e.g. ProbeToReference
    #[arg(long)]
    pub transform: Option<String>,

    /// Resolve the transform through the coordinate graph instead of the
    /// frame transforms alone
    #[arg(long)]
    pub use_graph: bool,

    /// Output reports as JSON
    #[arg(long)]
    pub json: bool,

    /// Include the correlation curve in JSON output
    #[arg(long, requires = "json")]
    pub correlation: bool,
}

/// Arguments for the `transform` command
#[derive(Parser, Debug)]
pub struct TransformArgs {
    /// Transform name, e.g. ImageToReference
    pub name: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "usnav.toml", env = "USNAV_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
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
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
