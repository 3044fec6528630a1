//! # usnav CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Transform graph queries over coordinate definitions
//! - Temporal calibration of recorded tracker / video sequences

mod cli;
mod commands;
mod error;
mod sequence;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_calibrate, run_info, run_transform, run_validate};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let observability = init_observability(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "usnav starting");

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Calibrate(args) => run_calibrate(args),
        Commands::Transform(args) => run_transform(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    if let Some(text) = observability.render_metrics() {
        eprint!("{text}");
    }

    result
}

/// Initialize logging and metrics based on CLI options
fn init_observability(cli: &Cli) -> Result<observability::Observability> {
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(&observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        log_level: log_level.to_string(),
        record_metrics: cli.print_metrics,
    })
}
