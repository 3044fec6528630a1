//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{NavConfig, PeakPositionMetric};
use serde::Serialize;
use tracing::info;
use transform_graph::TransformGraph;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    temporal_calibration: CalibrationInfo,
    frames: Vec<String>,
    transforms: Vec<TransformInfo>,
}

#[derive(Serialize)]
struct CalibrationInfo {
    sampling_resolution_sec: f64,
    max_tracker_lag_sec: f64,
    probe_to_reference_transform: String,
    peak_position: PeakPositionMetric,
    scanline_count: usize,
    min_valid_scanlines: usize,
}

#[derive(Serialize)]
struct TransformInfo {
    name: String,
    valid: bool,
    persistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<f64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = super::load_config(&args.config)?;
    let graph = super::build_graph(&config)?;

    if args.json {
        let info = build_config_info(&config, &graph);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, &graph, args);
    }

    Ok(())
}

fn build_config_info(config: &NavConfig, graph: &TransformGraph) -> ConfigInfo {
    let calibration = &config.temporal_calibration;

    ConfigInfo {
        version: format!("{:?}", config.version),
        temporal_calibration: CalibrationInfo {
            sampling_resolution_sec: calibration.sampling_resolution_sec,
            max_tracker_lag_sec: calibration.max_tracker_lag_sec,
            probe_to_reference_transform: calibration.probe_to_reference_transform.to_string(),
            peak_position: calibration.peak_position,
            scanline_count: calibration.scanline_count,
            min_valid_scanlines: calibration.min_valid_scanlines,
        },
        frames: graph.frames().map(|f| f.to_string()).collect(),
        transforms: config
            .coordinate_definitions
            .transforms
            .iter()
            .map(|def| TransformInfo {
                name: format!("{}To{}", def.from, def.to),
                valid: def.status.is_valid(),
                persistent: def.persistent,
                date: def.date.clone(),
                error: def.error,
            })
            .collect(),
    }
}

fn print_config_info(config: &NavConfig, graph: &TransformGraph, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    usnav Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let calibration = &config.temporal_calibration;
    println!("⏱  Temporal Calibration");
    println!("   ├─ Version: {:?}", config.version);
    println!(
        "   ├─ Sampling resolution: {} s",
        calibration.sampling_resolution_sec
    );
    println!("   ├─ Max tracker lag: {} s", calibration.max_tracker_lag_sec);
    println!(
        "   ├─ Tracker metric transform: {}",
        calibration.probe_to_reference_transform
    );
    println!("   ├─ Peak position: {:?}", calibration.peak_position);
    println!(
        "   └─ Scanlines: {} (min valid {})",
        calibration.scanline_count, calibration.min_valid_scanlines
    );

    let transforms = &config.coordinate_definitions.transforms;
    println!("\n📐 Coordinate Definitions ({})", transforms.len());
    for (i, def) in transforms.iter().enumerate() {
        let prefix = if i == transforms.len() - 1 {
            "└─"
        } else {
            "├─"
        };
        let mut line = format!("   {} {}To{}", prefix, def.from, def.to);
        if !def.status.is_valid() {
            line.push_str(" [invalid]");
        }
        if let Some(ref date) = def.date {
            line.push_str(&format!(", {}", date));
        }
        if let Some(error) = def.error {
            line.push_str(&format!(", error {}", error));
        }
        println!("{}", line);
    }

    let frames: Vec<String> = graph.frames().map(|f| f.to_string()).collect();
    println!("\n🧭 Frames ({}): {}", frames.len(), frames.join(", "));

    if args.graph && !graph.is_empty() {
        println!("\n{}", graph);
    }

    println!();
}
