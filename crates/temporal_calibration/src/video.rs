//! Video position metric: image row of the line (e.g. a water tank bottom)
//! crossing the middle column.
//!
//! Each frame is sampled along evenly spaced vertical scanlines. The largest
//! intensity peak on each scanline gives one point; a robust line fit through
//! the points gives the row at the centre column.

use contracts::{
    FrameSource, ImageData, NavError, StreamSummary, TemporalCalibrationConfig,
};
use nalgebra::Point2;
use tracing::debug;

use crate::line_fit::fit_line_ransac;
use crate::peak::{find_largest_peak, peak_position};
use crate::{PositionMetric, StreamMetric};

/// Why a video frame produced no position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSkip {
    /// Flagged invalid by the acquisition device
    InvalidFrame,
    /// Not an image frame
    NotImage,
    /// Buffer does not match the image dimensions
    BadImage,
    /// Fewer scanline peaks than `min_valid_scanlines`
    TooFewScanlines { found: usize },
    LineFitFailed,
    /// Line too close to vertical to cross the centre column
    NearVertical,
}

/// Peak points of the scanlines of one image, `(x, y)` in pixels
///
/// # Errors
/// `InvalidArgument` when the buffer length does not match the dimensions.
pub fn scanline_points(
    image: &ImageData,
    config: &TemporalCalibrationConfig,
) -> Result<Vec<Point2<f64>>, NavError> {
    let plane = image.intensity()?;
    if plane.width == 0 || plane.height == 0 {
        return Ok(Vec::new());
    }

    let spacing = plane.width as f64 / (config.scanline_count + 1) as f64;
    let mut points = Vec::with_capacity(config.scanline_count);
    for i in 0..config.scanline_count {
        let x = (spacing * (i + 1) as f64) as usize;
        if x >= plane.width {
            continue;
        }
        let profile: Vec<f64> = plane.column(x).into_iter().map(f64::from).collect();
        let Some(peak) = find_largest_peak(&profile) else {
            continue;
        };
        if let Some(y) = peak_position(&profile, &peak, config.peak_position) {
            points.push(Point2::new(x as f64, y));
        }
    }
    Ok(points)
}

/// Row of the fitted line at the centre column
pub fn line_position(
    points: &[Point2<f64>],
    width: u32,
    config: &TemporalCalibrationConfig,
) -> Result<f64, FrameSkip> {
    if points.len() < config.min_valid_scanlines {
        return Err(FrameSkip::TooFewScanlines {
            found: points.len(),
        });
    }
    let fit = fit_line_ransac(points, &config.line_fit).ok_or(FrameSkip::LineFitFailed)?;
    fit.model
        .y_at(0.5 * width as f64)
        .ok_or(FrameSkip::NearVertical)
}

/// Line row in every video frame
pub fn video_position_metric(
    frames: &dyn FrameSource,
    config: &TemporalCalibrationConfig,
) -> StreamMetric {
    let count = frames.frame_count();
    let mut metric = PositionMetric::with_capacity(count);
    let mut skipped = 0;
    let mut discarded_scanlines = 0u64;

    for index in 0..count {
        let Some(frame) = frames.frame(index) else {
            skipped += 1;
            continue;
        };

        let position = if !frame.is_valid() {
            Err(FrameSkip::InvalidFrame)
        } else if let Some(image) = frame.image_data() {
            match scanline_points(image, config) {
                Ok(points) => {
                    discarded_scanlines += config.scanline_count.saturating_sub(points.len()) as u64;
                    line_position(&points, image.width, config)
                }
                Err(e) => {
                    debug!(index, error = %e, "unreadable video frame");
                    Err(FrameSkip::BadImage)
                }
            }
        } else {
            Err(FrameSkip::NotImage)
        };

        match position {
            Ok(y) => {
                metric.push(frame.timestamp(), y);
            }
            Err(reason) => {
                debug!(index, timestamp = frame.timestamp(), ?reason, "skipping video frame");
                skipped += 1;
            }
        }
    }

    StreamMetric {
        summary: StreamSummary {
            frames: count,
            metric_samples: metric.len(),
            skipped_frames: skipped,
            out_of_order: metric.out_of_order(),
            resampled_samples: 0,
        },
        metric,
        discarded_scanlines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FrameList, PeakPositionMetric, TimestampedFrame};

    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 96;

    /// Horizontal bright band centred on `row` (may be fractional)
    fn band_image(row: f64) -> ImageData {
        let mut data = vec![0u8; (WIDTH * HEIGHT) as usize];
        for y in 0..HEIGHT as usize {
            let weight = (1.0 - (y as f64 - row).abs() / 2.0).max(0.0);
            let value = (200.0 * weight).round() as u8;
            for x in 0..WIDTH as usize {
                data[y * WIDTH as usize + x] = value;
            }
        }
        ImageData::gray8(WIDTH, HEIGHT, data)
    }

    #[test]
    fn test_band_row_recovered() {
        let config = TemporalCalibrationConfig::default();
        let points = scanline_points(&band_image(40.0), &config).unwrap();
        assert_eq!(points.len(), 20);
        let y = line_position(&points, WIDTH, &config).unwrap();
        assert!((y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_half_max_edge_sits_above_centre() {
        let config = TemporalCalibrationConfig {
            peak_position: PeakPositionMetric::HalfMaxRisingEdge,
            ..Default::default()
        };
        let points = scanline_points(&band_image(40.0), &config).unwrap();
        let y = line_position(&points, WIDTH, &config).unwrap();
        // Tent of half-width 2: half maximum is reached one row above the centre
        assert!((y - 39.0).abs() < 1e-9);
    }

    #[test]
    fn test_blank_image_has_too_few_scanlines() {
        let config = TemporalCalibrationConfig::default();
        let blank = ImageData::gray8(WIDTH, HEIGHT, vec![0u8; (WIDTH * HEIGHT) as usize]);
        let points = scanline_points(&blank, &config).unwrap();
        assert_eq!(
            line_position(&points, WIDTH, &config),
            Err(FrameSkip::TooFewScanlines { found: 0 })
        );
    }

    #[test]
    fn test_metric_counts_skips() {
        let config = TemporalCalibrationConfig::default();
        let blank = ImageData::gray8(WIDTH, HEIGHT, vec![0u8; (WIDTH * HEIGHT) as usize]);
        let frames = FrameList::from(vec![
            TimestampedFrame::image(0.0, band_image(30.0)),
            TimestampedFrame::image(0.1, blank),
            TimestampedFrame::image(0.2, band_image(35.0)).with_validity(false),
            TimestampedFrame::image(0.3, ImageData::gray8(WIDTH, HEIGHT, vec![0u8; 3])),
            TimestampedFrame::tracking(0.4, Vec::new()),
            TimestampedFrame::image(0.5, band_image(50.5)),
        ]);

        let result = video_position_metric(&frames, &config);
        assert_eq!(result.metric.len(), 2);
        assert!((result.metric.values()[1] - 50.5).abs() < 0.05);
        assert_eq!(result.summary.skipped_frames, 4);
        assert_eq!(result.discarded_scanlines, 20);
    }
}
