//! Cross-correlation of the resampled metrics and lag selection.

use contracts::{NavError, TemporalCalibrationConfig};

use crate::resample::resample;
use crate::PositionMetric;

/// Lag found by [`compute_lag`]
#[derive(Debug, Clone, PartialEq)]
pub struct LagEstimate {
    /// Positive when the tracker lags the video (seconds)
    pub lag_sec: f64,
    pub best_correlation: f64,
    /// Index `k` is lag `max_tracker_lag_sec - k * sampling_resolution_sec`
    pub correlation: Vec<f64>,
    pub overlap_sec: (f64, f64),
    pub tracker_samples: usize,
    pub video_samples: usize,
}

/// Dot product of `tracker` with each window of `video` it fits in
pub fn cross_correlate(tracker: &[f64], video: &[f64]) -> Vec<f64> {
    let m = tracker.len();
    if m == 0 || m > video.len() {
        return Vec::new();
    }
    video
        .windows(m)
        .map(|window| window.iter().zip(tracker).map(|(v, t)| v * t).sum())
        .collect()
}

/// Correlations within this fraction of the maximum are treated as equal
pub const CORRELATION_TIE_TOLERANCE: f64 = 1e-9;

/// Index of the maximum correlation.
///
/// Values within [`CORRELATION_TIE_TOLERANCE`] of the maximum are tied; among
/// them the index nearest `zero_lag_index` wins, then the first. Periodic
/// metrics otherwise give several equal peaks one period apart.
pub fn best_lag_index(correlation: &[f64], zero_lag_index: f64) -> Option<usize> {
    let max = correlation
        .iter()
        .copied()
        .filter(|c| c.is_finite())
        .fold(None, |best: Option<f64>, c| Some(best.map_or(c, |b| b.max(c))))?;
    let threshold = max - CORRELATION_TIE_TOLERANCE * max.abs();

    correlation
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c >= threshold)
        .map(|(k, _)| k)
        .min_by(|&a, &b| {
            let da = (a as f64 - zero_lag_index).abs();
            let db = (b as f64 - zero_lag_index).abs();
            da.total_cmp(&db)
        })
}

/// Lag between two normalised metrics: resample, correlate, pick the maximum.
///
/// # Errors
/// `InsufficientOverlap` when the metrics do not share enough time.
pub fn compute_lag(
    tracker: &PositionMetric,
    video: &PositionMetric,
    config: &TemporalCalibrationConfig,
) -> Result<LagEstimate, NavError> {
    let resolution = config.sampling_resolution_sec;
    let max_lag = config.max_tracker_lag_sec;
    let series = resample(tracker, video, resolution, max_lag)?;

    let correlation = cross_correlate(&series.tracker, &series.video);
    let k = best_lag_index(&correlation, max_lag / resolution).ok_or_else(|| {
        NavError::insufficient_overlap(format!(
            "{} tracker samples do not fit in {} video samples",
            series.tracker.len(),
            series.video.len()
        ))
    })?;

    Ok(LagEstimate {
        lag_sec: max_lag - k as f64 * resolution,
        best_correlation: correlation[k],
        overlap_sec: (series.start_sec, series.end_sec),
        tracker_samples: series.tracker.len(),
        video_samples: series.video.len(),
        correlation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SignalStage;
    use std::f64::consts::PI;

    use crate::normalize_metric;

    fn sinusoid(rate: f64, duration: f64, phase_sec: f64) -> PositionMetric {
        let n = (duration * rate).round() as usize;
        let mut metric: PositionMetric = (0..=n)
            .map(|i| {
                let t = i as f64 / rate;
                (t, (PI * (t + phase_sec)).sin())
            })
            .collect();
        normalize_metric(&mut metric, SignalStage::Tracker).unwrap();
        metric
    }

    #[test]
    fn test_cross_correlate_windows() {
        let c = cross_correlate(&[1.0, 2.0], &[0.0, 1.0, 2.0, 0.0]);
        assert_eq!(c, vec![2.0, 5.0, 2.0]);
        assert_eq!(best_lag_index(&c, 0.0), Some(1));
        assert!(cross_correlate(&[1.0, 2.0, 3.0], &[1.0]).is_empty());
    }

    #[test]
    fn test_tied_maxima_prefer_smallest_lag() {
        let c = [1.0, 3.0, 2.0, 3.0, 3.0 + 1e-12, 2.0];
        assert_eq!(best_lag_index(&c, 3.4), Some(3));
        assert_eq!(best_lag_index(&c, 0.0), Some(1));
        // Equidistant ties keep the first
        assert_eq!(best_lag_index(&[3.0, 1.0, 3.0], 1.0), Some(0));
        assert_eq!(best_lag_index(&[1.0, 3.0, 2.0], 0.0), Some(1));
        assert_eq!(best_lag_index(&[], 0.0), None);
    }

    #[test]
    fn test_periodic_lag_with_default_window() {
        // 0.5 Hz sine at 50 Hz for 10 s: the 2 s window holds two periods,
        // so 0.3 and -1.7 correlate equally
        let config = TemporalCalibrationConfig::default();

        let estimate =
            compute_lag(&sinusoid(50.0, 10.0, 0.0), &sinusoid(50.0, 10.0, 0.3), &config).unwrap();
        assert!(
            (estimate.lag_sec - 0.3).abs() <= config.sampling_resolution_sec + 1e-9,
            "lag {}",
            estimate.lag_sec
        );

        let estimate =
            compute_lag(&sinusoid(50.0, 10.0, 0.3), &sinusoid(50.0, 10.0, 0.0), &config).unwrap();
        assert!(
            (estimate.lag_sec + 0.3).abs() <= config.sampling_resolution_sec + 1e-9,
            "lag {}",
            estimate.lag_sec
        );
    }

    #[test]
    fn test_sinusoid_lag() {
        // Video leads the tracker by 0.3 s
        let tracker = sinusoid(250.0, 10.0, 0.0);
        let video = sinusoid(125.0, 10.0, 0.3);
        let config = TemporalCalibrationConfig {
            max_tracker_lag_sec: 1.0,
            ..Default::default()
        };

        let estimate = compute_lag(&tracker, &video, &config).unwrap();
        assert!(
            (estimate.lag_sec - 0.3).abs() <= config.sampling_resolution_sec + 1e-9,
            "lag {}",
            estimate.lag_sec
        );
        assert_eq!(estimate.correlation.len(), estimate.video_samples - estimate.tracker_samples + 1);
    }

    #[test]
    fn test_negative_lag() {
        // Tracker leads the video by 0.25 s
        let tracker = sinusoid(250.0, 10.0, 0.25);
        let video = sinusoid(125.0, 10.0, 0.0);
        let config = TemporalCalibrationConfig {
            max_tracker_lag_sec: 1.0,
            ..Default::default()
        };

        let estimate = compute_lag(&tracker, &video, &config).unwrap();
        assert!((estimate.lag_sec + 0.25).abs() <= config.sampling_resolution_sec + 1e-9);
    }

    #[test]
    fn test_zero_overlap() {
        let tracker: PositionMetric = [(0.0, -0.5), (1.0, 0.5)].into_iter().collect();
        let video: PositionMetric = [(2.0, -0.5), (3.0, 0.5)].into_iter().collect();
        let err = compute_lag(&tracker, &video, &TemporalCalibrationConfig::default()).unwrap_err();
        assert!(matches!(err, NavError::InsufficientOverlap { .. }));
    }
}
