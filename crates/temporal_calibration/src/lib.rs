//! # Temporal Calibration
//!
//! Estimates the time offset between a pose tracker and an ultrasound video
//! stream recorded while the probe moves periodically over a line target.
//!
//! Pipeline:
//! 1. Tracker metric: length of the probe-to-reference translation per frame
//! 2. Video metric: row of the target line at the image centre per frame
//! 3. Normalise both to zero mean and unit peak-to-peak
//! 4. Resample onto a common grid
//! 5. Cross-correlate and take the best lag
//!
//! ## Example
//!
//! ```ignore
//! use temporal_calibration::TemporalCalibration;
//!
//! let mut engine = TemporalCalibration::new(config.temporal_calibration.clone());
//! engine.set_tracker_frames(&tracker_frames);
//! engine.set_video_frames(&video_frames);
//! engine.update()?;
//! println!("tracker lag: {:.3} s", engine.tracker_lag_sec()?);
//! ```

mod correlation;
mod engine;
mod line_fit;
mod metric;
mod peak;
mod ransac;
mod resample;
mod tracker;
mod video;

pub use correlation::{
    best_lag_index, compute_lag, cross_correlate, LagEstimate, CORRELATION_TIE_TOLERANCE,
};
pub use engine::TemporalCalibration;
pub use line_fit::{fit_line, fit_line_ransac, LineFit, LineModel, NEAR_VERTICAL_DIRECTION_X};
pub use metric::{normalize_metric, PositionMetric};
pub use peak::{find_largest_peak, peak_position, Peak};
pub use ransac::{ransac, Estimator, RansacOptions, RansacResult};
pub use resample::{resample, ResampledSeries};
pub use tracker::{tracker_position_metric, StreamMetric};
pub use video::{line_position, scanline_points, video_position_metric, FrameSkip};

// Re-export contracts types
pub use contracts::{CalibrationReport, PeakPositionMetric, TemporalCalibrationConfig};
