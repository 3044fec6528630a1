//! Temporal calibration configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::TransformName;

/// Finest sampling resolution a caller may request (seconds)
pub const MIN_SAMPLING_RESOLUTION_SEC: f64 = 0.00001;
pub const DEFAULT_SAMPLING_RESOLUTION_SEC: f64 = 0.001;
pub const DEFAULT_MAX_TRACKER_LAG_SEC: f64 = 2.0;
pub const DEFAULT_PROBE_TO_REFERENCE_TRANSFORM: &str = "ProbeToReference";
/// A metric swinging less than this (before normalization) is treated as constant
pub const MIN_SIGNAL_PEAK_TO_PEAK: f64 = 0.01;
/// Two timestamps closer than this are considered identical (seconds)
pub const TIMESTAMP_EPSILON_SEC: f64 = 0.0001;
pub const DEFAULT_SCANLINE_COUNT: usize = 20;
pub const DEFAULT_MIN_VALID_SCANLINES: usize = 5;

/// Temporal calibration configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TemporalCalibrationConfig {
    /// Spacing of the resampling grid (seconds)
    #[serde(default = "default_sampling_resolution")]
    #[validate(range(min = 0.00001))]
    pub sampling_resolution_sec: f64,

    /// Largest tracker lag searched, in either direction (seconds)
    #[serde(default = "default_max_tracker_lag")]
    #[validate(range(min = 0.0))]
    pub max_tracker_lag_sec: f64,

    /// Transform whose translation drives the tracker position metric
    #[serde(default = "default_probe_to_reference")]
    pub probe_to_reference_transform: TransformName,

    /// How a sub-pixel position is taken from an intensity peak
    #[serde(default)]
    pub peak_position: PeakPositionMetric,

    /// Number of vertical scanlines sampled per video frame
    #[serde(default = "default_scanline_count")]
    #[validate(range(min = 2))]
    pub scanline_count: usize,

    /// Frames with fewer scanline detections are skipped
    #[serde(default = "default_min_valid_scanlines")]
    #[validate(range(min = 2))]
    pub min_valid_scanlines: usize,

    /// Robust line fit parameters
    #[serde(default)]
    #[validate(nested)]
    pub line_fit: LineFitConfig,
}

impl Default for TemporalCalibrationConfig {
    fn default() -> Self {
        Self {
            sampling_resolution_sec: DEFAULT_SAMPLING_RESOLUTION_SEC,
            max_tracker_lag_sec: DEFAULT_MAX_TRACKER_LAG_SEC,
            probe_to_reference_transform: default_probe_to_reference(),
            peak_position: PeakPositionMetric::default(),
            scanline_count: DEFAULT_SCANLINE_COUNT,
            min_valid_scanlines: DEFAULT_MIN_VALID_SCANLINES,
            line_fit: LineFitConfig::default(),
        }
    }
}

fn default_sampling_resolution() -> f64 {
    DEFAULT_SAMPLING_RESOLUTION_SEC
}

fn default_max_tracker_lag() -> f64 {
    DEFAULT_MAX_TRACKER_LAG_SEC
}

fn default_probe_to_reference() -> TransformName {
    TransformName::from_static("Probe", "Reference")
}

fn default_scanline_count() -> usize {
    DEFAULT_SCANLINE_COUNT
}

fn default_min_valid_scanlines() -> usize {
    DEFAULT_MIN_VALID_SCANLINES
}

/// Peak position strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakPositionMetric {
    /// Intensity-weighted centroid of the peak
    #[default]
    Centroid,
    /// Position where the peak first rises to half of its maximum
    HalfMaxRisingEdge,
}

/// RANSAC line fit configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineFitConfig {
    /// Largest point-to-line distance still counted as inlier (pixels)
    #[validate(range(exclusive_min = 0.0))]
    pub inlier_distance_px: f64,

    /// Desired probability of drawing at least one outlier-free sample
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,

    /// Hard iteration cap
    #[validate(range(min = 1))]
    pub max_iterations: usize,

    /// RNG seed, fixed so repeated runs agree
    pub seed: u64,
}

impl Default for LineFitConfig {
    fn default() -> Self {
        Self {
            inlier_distance_px: 0.5,
            confidence: 0.999,
            max_iterations: 1000,
            seed: 1_234_567,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TemporalCalibrationConfig::default();
        assert_eq!(config.sampling_resolution_sec, 0.001);
        assert_eq!(config.max_tracker_lag_sec, 2.0);
        assert_eq!(
            config.probe_to_reference_transform.to_string(),
            DEFAULT_PROBE_TO_REFERENCE_TRANSFORM
        );
        assert_eq!(config.peak_position, PeakPositionMetric::Centroid);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: TemporalCalibrationConfig =
            serde_json::from_str(r#"{ "max_tracker_lag_sec": 0.5 }"#).unwrap();
        assert_eq!(config.max_tracker_lag_sec, 0.5);
        assert_eq!(config.scanline_count, 20);
        assert_eq!(config.line_fit.inlier_distance_px, 0.5);
    }

    #[test]
    fn test_resolution_below_floor_fails_validation() {
        let config = TemporalCalibrationConfig {
            sampling_resolution_sec: 0.000001,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_peak_position_names() {
        let metric: PeakPositionMetric = serde_json::from_str("\"half_max_rising_edge\"").unwrap();
        assert_eq!(metric, PeakPositionMetric::HalfMaxRisingEdge);
    }
}
