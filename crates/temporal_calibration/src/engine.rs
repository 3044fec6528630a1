//! Temporal calibration engine.

use contracts::{
    CalibrationReport, DirectTransformResolver, FrameSource, NavError, PeakPositionMetric,
    SignalStage, StreamSummary, TemporalCalibrationConfig, TransformName, TransformResolver,
    MIN_SAMPLING_RESOLUTION_SEC,
};
use metrics::{counter, gauge};
use tracing::{debug, info, instrument, warn};

use crate::correlation::compute_lag;
use crate::metric::normalize_metric;
use crate::tracker::tracker_position_metric;
use crate::video::video_position_metric;

/// Estimates the time offset between a tracker stream and a video stream.
///
/// Frame lists are borrowed from the caller; nothing is copied until
/// [`update`](Self::update) runs.
pub struct TemporalCalibration<'a> {
    config: TemporalCalibrationConfig,
    resolver: Box<dyn TransformResolver + 'a>,
    tracker_frames: Option<&'a dyn FrameSource>,
    video_frames: Option<&'a dyn FrameSource>,
    report: Option<CalibrationReport>,
}

impl std::fmt::Debug for TemporalCalibration<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporalCalibration")
            .field("config", &self.config)
            .field(
                "tracker_frames",
                &self.tracker_frames.map(|frames| frames.frame_count()),
            )
            .field(
                "video_frames",
                &self.video_frames.map(|frames| frames.frame_count()),
            )
            .field("tracker_lag_sec", &self.report.as_ref().map(|r| r.tracker_lag_sec))
            .finish()
    }
}

impl Default for TemporalCalibration<'_> {
    fn default() -> Self {
        Self::new(TemporalCalibrationConfig::default())
    }
}

impl<'a> TemporalCalibration<'a> {
    /// Engine resolving the probe transform directly from tracker frames
    pub fn new(config: TemporalCalibrationConfig) -> Self {
        Self {
            config,
            resolver: Box::new(DirectTransformResolver),
            tracker_frames: None,
            video_frames: None,
            report: None,
        }
    }

    /// Replace the transform resolver (e.g. a graph-backed one)
    pub fn with_resolver(mut self, resolver: impl TransformResolver + 'a) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &TemporalCalibrationConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TemporalCalibrationConfig) {
        self.config = config;
    }

    pub fn set_tracker_frames(&mut self, frames: &'a dyn FrameSource) {
        self.tracker_frames = Some(frames);
    }

    pub fn set_video_frames(&mut self, frames: &'a dyn FrameSource) {
        self.video_frames = Some(frames);
    }

    pub fn set_sampling_resolution_sec(&mut self, resolution: f64) {
        self.config.sampling_resolution_sec = resolution;
    }

    pub fn set_max_tracker_lag_sec(&mut self, max_lag: f64) {
        self.config.max_tracker_lag_sec = max_lag;
    }

    pub fn set_probe_to_reference_transform(&mut self, name: TransformName) {
        self.config.probe_to_reference_transform = name;
    }

    pub fn set_peak_position(&mut self, metric: PeakPositionMetric) {
        self.config.peak_position = metric;
    }

    /// Run the calibration.
    ///
    /// A failed run clears the previous result.
    ///
    /// # Errors
    /// - `InvalidArgument`: a frame list is missing or empty
    /// - `InvalidConfiguration`: resolution or lag window out of range
    /// - `InsufficientSignal`: a position metric is missing or flat
    /// - `InsufficientOverlap`: the streams share too little time
    #[instrument(
        level = "debug",
        name = "temporal_calibration_update",
        skip(self),
        fields(
            transform = %self.config.probe_to_reference_transform,
            max_lag_sec = self.config.max_tracker_lag_sec
        )
    )]
    pub fn update(&mut self) -> Result<(), NavError> {
        self.report = None;
        counter!("usnav_calibrations_total").increment(1);

        match self.compute() {
            Ok(report) => {
                info!(
                    tracker_lag_sec = report.tracker_lag_sec,
                    best_correlation = report.best_correlation,
                    tracker_samples = report.tracker.resampled_samples,
                    video_samples = report.video.resampled_samples,
                    "temporal calibration complete"
                );
                gauge!("usnav_tracker_lag_seconds").set(report.tracker_lag_sec);
                self.report = Some(report);
                Ok(())
            }
            Err(e) => {
                counter!("usnav_calibrations_failed_total").increment(1);
                warn!(error = %e, "temporal calibration failed");
                Err(e)
            }
        }
    }

    /// Lag of the tracker behind the video (seconds)
    ///
    /// # Errors
    /// `NotYetComputed` until an [`update`](Self::update) succeeds.
    pub fn tracker_lag_sec(&self) -> Result<f64, NavError> {
        self.report().map(|r| r.tracker_lag_sec)
    }

    /// Full result of the last successful update
    pub fn report(&self) -> Result<&CalibrationReport, NavError> {
        self.report.as_ref().ok_or(NavError::NotYetComputed)
    }

    fn compute(&self) -> Result<CalibrationReport, NavError> {
        let tracker_frames = non_empty(self.tracker_frames, "tracker")?;
        let video_frames = non_empty(self.video_frames, "video")?;
        validate_config(&self.config)?;

        let mut tracker = tracker_position_metric(
            tracker_frames,
            &self.config.probe_to_reference_transform,
            self.resolver.as_ref(),
        );
        counter!("usnav_tracker_frames_skipped_total")
            .increment(tracker.summary.skipped_frames as u64);
        debug!(
            samples = tracker.metric.len(),
            skipped = tracker.summary.skipped_frames,
            "tracker position metric"
        );
        normalize_metric(&mut tracker.metric, SignalStage::Tracker)?;

        let mut video = video_position_metric(video_frames, &self.config);
        counter!("usnav_video_frames_skipped_total").increment(video.summary.skipped_frames as u64);
        counter!("usnav_scanlines_discarded_total").increment(video.discarded_scanlines);
        debug!(
            samples = video.metric.len(),
            skipped = video.summary.skipped_frames,
            discarded_scanlines = video.discarded_scanlines,
            "video position metric"
        );
        normalize_metric(&mut video.metric, SignalStage::Video)?;

        let estimate = compute_lag(&tracker.metric, &video.metric, &self.config)?;

        Ok(CalibrationReport {
            tracker_lag_sec: estimate.lag_sec,
            best_correlation: estimate.best_correlation,
            correlation: estimate.correlation,
            sampling_resolution_sec: self.config.sampling_resolution_sec,
            max_tracker_lag_sec: self.config.max_tracker_lag_sec,
            overlap_sec: estimate.overlap_sec,
            tracker: StreamSummary {
                resampled_samples: estimate.tracker_samples,
                ..tracker.summary
            },
            video: StreamSummary {
                resampled_samples: estimate.video_samples,
                ..video.summary
            },
            discarded_scanlines: video.discarded_scanlines,
        })
    }
}

fn non_empty<'a>(
    frames: Option<&'a dyn FrameSource>,
    stream: &str,
) -> Result<&'a dyn FrameSource, NavError> {
    match frames {
        Some(frames) if !frames.is_empty() => Ok(frames),
        Some(_) => Err(NavError::invalid_argument(format!(
            "{stream} frame list is empty"
        ))),
        None => Err(NavError::invalid_argument(format!(
            "{stream} frame list is not set"
        ))),
    }
}

fn validate_config(config: &TemporalCalibrationConfig) -> Result<(), NavError> {
    let resolution = config.sampling_resolution_sec;
    if !resolution.is_finite() || resolution < MIN_SAMPLING_RESOLUTION_SEC {
        return Err(NavError::invalid_configuration(
            "sampling_resolution_sec",
            format!("must be at least {MIN_SAMPLING_RESOLUTION_SEC} s, got {resolution}"),
        ));
    }

    let max_lag = config.max_tracker_lag_sec;
    if !max_lag.is_finite() || max_lag < 0.0 {
        return Err(NavError::invalid_configuration(
            "max_tracker_lag_sec",
            format!("must be finite and >= 0, got {max_lag}"),
        ));
    }

    if config.min_valid_scanlines < 2 || config.min_valid_scanlines > config.scanline_count {
        return Err(NavError::invalid_configuration(
            "min_valid_scanlines",
            format!(
                "must be in [2, scanline_count = {}], got {}",
                config.scanline_count, config.min_valid_scanlines
            ),
        ));
    }

    let line_fit = &config.line_fit;
    let distance_ok = line_fit.inlier_distance_px.is_finite() && line_fit.inlier_distance_px > 0.0;
    if !distance_ok || line_fit.max_iterations == 0 {
        return Err(NavError::invalid_configuration(
            "line_fit",
            "inlier_distance_px must be > 0 and max_iterations >= 1",
        ));
    }

    Ok(())
}
