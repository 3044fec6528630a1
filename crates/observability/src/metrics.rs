//! Calibration metrics
//!
//! Records the outcome of temporal calibration runs through the `metrics`
//! facade and aggregates them in memory for summaries.

use contracts::{CalibrationReport, NavError};
use metrics::{counter, gauge, histogram};

/// Record a successful calibration run
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_calibration_report;
///
/// engine.update()?;
/// record_calibration_report(engine.report()?);
/// ```
pub fn record_calibration_report(report: &CalibrationReport) {
    gauge!("usnav_calibration_lag_ms").set(report.tracker_lag_sec * 1000.0);
    histogram!("usnav_calibration_lag_ms_hist").record(report.tracker_lag_sec * 1000.0);
    gauge!("usnav_calibration_best_correlation").set(report.best_correlation);

    for (stream, summary) in [("tracker", &report.tracker), ("video", &report.video)] {
        gauge!("usnav_calibration_metric_samples", "stream" => stream)
            .set(summary.metric_samples as f64);
        gauge!("usnav_calibration_resampled_samples", "stream" => stream)
            .set(summary.resampled_samples as f64);
        if summary.out_of_order > 0 {
            counter!("usnav_samples_out_of_order_total", "stream" => stream)
                .increment(summary.out_of_order as u64);
        }
    }
}

/// Record a failed calibration run by error kind
pub fn record_calibration_failure(error: &NavError) {
    counter!(
        "usnav_calibration_failures_total",
        "kind" => failure_kind(error)
    )
    .increment(1);
}

fn failure_kind(error: &NavError) -> &'static str {
    match error {
        NavError::InvalidArgument { .. } => "invalid_argument",
        NavError::InvalidConfiguration { .. } => "invalid_configuration",
        NavError::InsufficientSignal { .. } => "insufficient_signal",
        NavError::InsufficientOverlap { .. } => "insufficient_overlap",
        _ => "other",
    }
}

/// Record a transform graph lookup
pub fn record_transform_lookup(found: bool) {
    let status = if found { "found" } else { "not_found" };
    counter!("usnav_transform_lookups_total", "status" => status).increment(1);
}

/// In-memory aggregation over several calibration runs
#[derive(Debug, Clone, Default)]
pub struct CalibrationMetricsAggregator {
    pub runs: u64,
    pub failures: u64,
    pub lag_ms: RunningStats,
    pub best_correlation: RunningStats,
    pub skipped_tracker_frames: u64,
    pub skipped_video_frames: u64,
    pub discarded_scanlines: u64,
}

impl CalibrationMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one run outcome
    pub fn update(&mut self, outcome: Result<&CalibrationReport, &NavError>) {
        self.runs += 1;
        match outcome {
            Ok(report) => {
                self.lag_ms.push(report.tracker_lag_sec * 1000.0);
                self.best_correlation.push(report.best_correlation);
                self.skipped_tracker_frames += report.tracker.skipped_frames as u64;
                self.skipped_video_frames += report.video.skipped_frames as u64;
                self.discarded_scanlines += report.discarded_scanlines;
            }
            Err(_) => self.failures += 1,
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            runs: self.runs,
            failures: self.failures,
            lag_ms: StatsSummary::from(&self.lag_ms),
            best_correlation: StatsSummary::from(&self.best_correlation),
            skipped_tracker_frames: self.skipped_tracker_frames,
            skipped_video_frames: self.skipped_video_frames,
            discarded_scanlines: self.discarded_scanlines,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregated summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub runs: u64,
    pub failures: u64,
    pub lag_ms: StatsSummary,
    pub best_correlation: StatsSummary,
    pub skipped_tracker_frames: u64,
    pub skipped_video_frames: u64,
    pub discarded_scanlines: u64,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Calibration Summary ===")?;
        writeln!(f, "Runs: {} ({} failed)", self.runs, self.failures)?;
        writeln!(f, "Tracker lag (ms): {}", self.lag_ms)?;
        writeln!(f, "Best correlation: {}", self.best_correlation)?;
        writeln!(
            f,
            "Skipped frames: tracker {}, video {}",
            self.skipped_tracker_frames, self.skipped_video_frames
        )?;
        writeln!(f, "Discarded scanlines: {}", self.discarded_scanlines)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
