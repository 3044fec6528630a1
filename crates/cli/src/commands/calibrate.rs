//! `calibrate` command implementation.

use anyhow::{Context, Result};
use contracts::{CalibrationReport, NavConfig, TemporalCalibrationConfig, TransformName};
use observability::CalibrationMetricsAggregator;
use serde::Serialize;
use temporal_calibration::TemporalCalibration;
use tracing::{info, warn};
use transform_graph::GraphTransformResolver;

use crate::cli::CalibrateArgs;
use crate::sequence::{load_sequence, Sequence};

/// One sequence outcome for JSON output
#[derive(Serialize)]
struct SequenceResult {
    sequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<CalibrationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the `calibrate` command
pub fn run_calibrate(args: &CalibrateArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => super::load_config(path)?,
        None => NavConfig::default(),
    };
    let calibration = calibration_config(&config, args)?;

    let resolver = if args.use_graph {
        let base = super::build_graph(&config)?;
        info!(edges = base.edge_count(), "Resolving through coordinate graph");
        Some(GraphTransformResolver::with_base(base))
    } else {
        None
    };

    let mut aggregator = CalibrationMetricsAggregator::new();
    let mut results = Vec::with_capacity(args.sequences.len());

    for path in &args.sequences {
        let sequence = load_sequence(path)
            .with_context(|| format!("Failed to load sequence {}", path.display()))?;

        let mut engine = TemporalCalibration::new(calibration.clone());
        if let Some(ref resolver) = resolver {
            engine = engine.with_resolver(resolver.clone());
        }
        let outcome = calibrate_sequence(&mut engine, &sequence);

        match &outcome {
            Ok(report) => {
                observability::record_calibration_report(report);
                aggregator.update(Ok(report));
            }
            Err(e) => {
                warn!(sequence = %path.display(), error = %e, "Calibration failed");
                observability::record_calibration_failure(e);
                aggregator.update(Err(e));
            }
        }

        results.push(SequenceResult {
            sequence: path.display().to_string(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
            report: outcome.ok().map(|mut report| {
                if !args.correlation {
                    report.correlation.clear();
                }
                report
            }),
        });
    }

    let summary = aggregator.summary();
    if args.json {
        let json =
            serde_json::to_string_pretty(&results).context("Failed to serialize reports")?;
        println!("{}", json);
    } else {
        for result in &results {
            print_result(result);
        }
        if results.len() > 1 {
            println!("\n{}", summary);
        }
    }

    if summary.failures > 0 {
        anyhow::bail!(
            "{} of {} calibrations failed",
            summary.failures,
            summary.runs
        );
    }
    Ok(())
}

/// Configuration with command line overrides applied and re-validated
fn calibration_config(config: &NavConfig, args: &CalibrateArgs) -> Result<TemporalCalibrationConfig> {
    let mut calibration = config.temporal_calibration.clone();

    if let Some(resolution) = args.resolution {
        info!(resolution, "Overriding sampling resolution from CLI");
        calibration.sampling_resolution_sec = resolution;
    }
    if let Some(max_lag) = args.max_lag {
        info!(max_lag, "Overriding max tracker lag from CLI");
        calibration.max_tracker_lag_sec = max_lag;
    }
    if let Some(ref name) = args.transform {
        calibration.probe_to_reference_transform = TransformName::parse(name)
            .with_context(|| format!("Invalid transform name '{}'", name))?;
    }

    let overridden = NavConfig {
        temporal_calibration: calibration,
        ..config.clone()
    };
    config_loader::ConfigLoader::validate(&overridden).context("Invalid calibration settings")?;
    Ok(overridden.temporal_calibration)
}

fn calibrate_sequence<'a>(
    engine: &mut TemporalCalibration<'a>,
    sequence: &'a Sequence,
) -> std::result::Result<CalibrationReport, contracts::NavError> {
    engine.set_tracker_frames(&sequence.tracker);
    engine.set_video_frames(&sequence.video);
    engine.update()?;
    engine.report().cloned()
}

fn print_result(result: &SequenceResult) {
    println!("📼 {}", result.sequence);
    match (&result.report, &result.error) {
        (Some(report), _) => {
            println!(
                "   ├─ Tracker lag: {:.3} ms",
                report.tracker_lag_sec * 1000.0
            );
            println!("   ├─ Best correlation: {:.4}", report.best_correlation);
            println!(
                "   ├─ Overlap: {:.3} s .. {:.3} s",
                report.overlap_sec.0, report.overlap_sec.1
            );
            println!(
                "   ├─ Tracker frames: {} ({} skipped)",
                report.tracker.frames, report.tracker.skipped_frames
            );
            println!(
                "   ├─ Video frames: {} ({} skipped)",
                report.video.frames, report.video.skipped_frames
            );
            println!("   └─ Discarded scanlines: {}", report.discarded_scanlines);
        }
        (None, Some(error)) => println!("   └─ ✗ {}", error),
        (None, None) => {}
    }
}
