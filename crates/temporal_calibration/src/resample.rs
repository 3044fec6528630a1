//! Resampling of both metrics onto a common uniform time grid.

use contracts::{NavError, TIMESTAMP_EPSILON_SEC};

use crate::PositionMetric;

/// Both metrics on a uniform grid over their common time range
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledSeries {
    /// Common range `[start, end]` of the two metrics
    pub start_sec: f64,
    pub end_sec: f64,
    pub resolution_sec: f64,
    /// Tracker grid, inset by the lag window on both ends
    pub tracker: Vec<f64>,
    /// Video grid, spanning the whole common range
    pub video: Vec<f64>,
}

/// Resample both metrics at `resolution_sec`.
///
/// The video grid is `start + n * resolution < end`; the tracker grid is
/// `(start + max_lag) + n * resolution < end - max_lag`, so each tracker
/// sample can be compared against video shifted by up to `max_lag` either way.
///
/// # Errors
/// `InsufficientOverlap` when the common range is not longer than twice the
/// lag window.
pub fn resample(
    tracker: &PositionMetric,
    video: &PositionMetric,
    resolution_sec: f64,
    max_lag_sec: f64,
) -> Result<ResampledSeries, NavError> {
    let (Some((tracker_start, tracker_end)), Some((video_start, video_end))) =
        (tracker.time_range(), video.time_range())
    else {
        return Err(NavError::insufficient_overlap("a position metric is empty"));
    };

    let start = tracker_start.max(video_start);
    let end = tracker_end.min(video_end);
    if start + max_lag_sec >= end - max_lag_sec {
        return Err(NavError::insufficient_overlap(format!(
            "common range [{start:.4}, {end:.4}] s is too short for a {max_lag_sec} s lag window"
        )));
    }

    Ok(ResampledSeries {
        start_sec: start,
        end_sec: end,
        resolution_sec,
        tracker: sample_grid(tracker, start + max_lag_sec, end - max_lag_sec, resolution_sec),
        video: sample_grid(video, start, end, resolution_sec),
    })
}

fn sample_grid(metric: &PositionMetric, from: f64, to: f64, step: f64) -> Vec<f64> {
    (0..)
        .map(|n| from + n as f64 * step)
        .take_while(|&t| t < to)
        .filter_map(|t| metric.interpolate(t, TIMESTAMP_EPSILON_SEC))
        .collect()
}
