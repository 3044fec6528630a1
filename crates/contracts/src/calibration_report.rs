//! CalibrationReport - Temporal calibration output

use serde::{Deserialize, Serialize};

/// Result of one successful temporal calibration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Positive when the tracker stream lags the video stream (seconds)
    pub tracker_lag_sec: f64,

    /// Correlation at the chosen lag
    pub best_correlation: f64,

    /// Correlation per lag step; index `k` is lag `max_tracker_lag_sec - k * sampling_resolution_sec`
    pub correlation: Vec<f64>,

    pub sampling_resolution_sec: f64,
    pub max_tracker_lag_sec: f64,

    /// Common time range of both metrics `[start, end]` (seconds)
    pub overlap_sec: (f64, f64),

    pub tracker: StreamSummary,
    pub video: StreamSummary,

    /// Scanlines without a usable intensity peak, over all video frames
    pub discarded_scanlines: u64,
}

impl CalibrationReport {
    /// `(lag, correlation)` pairs from `+max_tracker_lag_sec` downwards
    pub fn correlation_by_lag(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.correlation.iter().enumerate().map(|(k, &c)| {
            (
                self.max_tracker_lag_sec - k as f64 * self.sampling_resolution_sec,
                c,
            )
        })
    }
}

/// Per-stream sample accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Frames handed to the engine
    pub frames: usize,

    /// Frames that produced a metric sample
    pub metric_samples: usize,

    /// Frames without a usable position (invalid, unresolvable, failed fit)
    pub skipped_frames: usize,

    /// Samples dropped for a duplicate or decreasing timestamp
    pub out_of_order: usize,

    /// Samples on the resampling grid
    pub resampled_samples: usize,
}
