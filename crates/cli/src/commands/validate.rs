//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::NavConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    transform_count: usize,
    frame_count: usize,
    max_tracker_lag_sec: f64,
    sampling_resolution_sec: f64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            let frame_count = super::build_graph(&config)
                .map(|graph| graph.frames().count())
                .unwrap_or(0);
            let calibration = &config.temporal_calibration;

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    transform_count: config.coordinate_definitions.transforms.len(),
                    frame_count,
                    max_tracker_lag_sec: calibration.max_tracker_lag_sec,
                    sampling_resolution_sec: calibration.sampling_resolution_sec,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &NavConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.coordinate_definitions.transforms.is_empty() {
        warnings.push(
            "No coordinate definitions - only transforms carried by frames can be resolved"
                .to_string(),
        );
    }

    for def in &config.coordinate_definitions.transforms {
        if !def.status.is_valid() {
            warnings.push(format!(
                "Transform '{}To{}' is marked invalid",
                def.from, def.to
            ));
        }
    }

    let calibration = &config.temporal_calibration;
    if calibration.max_tracker_lag_sec == 0.0 {
        warnings.push("max_tracker_lag_sec is 0 - only zero lag will be tested".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Transforms: {}", summary.transform_count);
            println!("  Frames: {}", summary.frame_count);
            println!("  Max tracker lag: {} s", summary.max_tracker_lag_sec);
            println!("  Sampling resolution: {} s", summary.sampling_resolution_sec);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
