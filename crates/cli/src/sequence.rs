//! Recorded sequence files.
//!
//! A sequence lists tracker frames with their named transforms and video
//! frames pointing at image files relative to the sequence file:
//!
//! ```toml
//! [[tracker]]
//! timestamp = 0.0
//! transforms = [
//!     { name = "ProbeToReference", matrix = [[1,0,0,0],[0,1,0,0],[0,0,1,30],[0,0,0,1]] },
//! ]
//!
//! [[video]]
//! timestamp = 0.0
//! image = "frames/0000.png"
//! ```

use std::path::{Path, PathBuf};

use contracts::{
    matrix_from_rows, FrameList, FrameTransform, ImageData, MatrixRows, TimestampedFrame,
    TransformName, TransformStatus,
};
use image::ImageReader;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, Result};

#[derive(Debug, Deserialize)]
struct SequenceFile {
    #[serde(default)]
    tracker: Vec<TrackerRecord>,
    #[serde(default)]
    video: Vec<VideoRecord>,
}

#[derive(Debug, Deserialize)]
struct TrackerRecord {
    timestamp: f64,
    #[serde(default = "default_valid")]
    valid: bool,
    #[serde(default)]
    transforms: Vec<TransformRecord>,
}

#[derive(Debug, Deserialize)]
struct TransformRecord {
    name: TransformName,
    matrix: MatrixRows,
    #[serde(default)]
    status: TransformStatus,
}

#[derive(Debug, Deserialize)]
struct VideoRecord {
    timestamp: f64,
    #[serde(default = "default_valid")]
    valid: bool,
    image: PathBuf,
}

fn default_valid() -> bool {
    true
}

/// Tracker and video frames of one recording
#[derive(Debug)]
pub struct Sequence {
    pub path: PathBuf,
    pub tracker: FrameList,
    pub video: FrameList,
}

/// Load a sequence file and decode its video frames to 8-bit grey
pub fn load_sequence(path: &Path) -> Result<Sequence> {
    if !path.exists() {
        return Err(CliError::sequence_not_found(path));
    }
    let content = std::fs::read_to_string(path)?;
    let file: SequenceFile = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| CliError::sequence_parse(path, e.to_string()))?,
        Some("toml") => {
            toml::from_str(&content).map_err(|e| CliError::sequence_parse(path, e.to_string()))?
        }
        other => {
            return Err(CliError::sequence_parse(
                path,
                format!("unsupported sequence format: {other:?}"),
            ))
        }
    };

    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let tracker = file
        .tracker
        .into_iter()
        .enumerate()
        .map(|(index, record)| tracker_frame(index, record))
        .collect::<Result<FrameList>>()?;

    let video = file
        .video
        .into_iter()
        .enumerate()
        .map(|(index, record)| video_frame(base, index, record))
        .collect::<Result<FrameList>>()?;

    debug!(
        path = %path.display(),
        tracker_frames = tracker.len(),
        video_frames = video.len(),
        "sequence loaded"
    );

    Ok(Sequence {
        path: path.to_path_buf(),
        tracker,
        video,
    })
}

fn tracker_frame(index: usize, record: TrackerRecord) -> Result<TimestampedFrame> {
    check_timestamp("tracker", index, record.timestamp)?;
    let transforms = record
        .transforms
        .into_iter()
        .map(|t| FrameTransform::new(t.name, matrix_from_rows(&t.matrix), t.status))
        .collect();
    Ok(TimestampedFrame::tracking(record.timestamp, transforms).with_validity(record.valid))
}

fn video_frame(base: &Path, index: usize, record: VideoRecord) -> Result<TimestampedFrame> {
    check_timestamp("video", index, record.timestamp)?;
    let path = base.join(&record.image);
    let image = ImageReader::open(&path)
        .map_err(|e| CliError::image_load(&path, e.to_string()))?
        .decode()
        .map_err(|e| CliError::image_load(&path, e.to_string()))?
        .to_luma8();

    let (width, height) = image.dimensions();
    let data = ImageData::gray8(width, height, image.into_raw());
    Ok(TimestampedFrame::image(record.timestamp, data).with_validity(record.valid))
}

fn check_timestamp(stream: &'static str, index: usize, timestamp: f64) -> Result<()> {
    if timestamp.is_finite() {
        Ok(())
    } else {
        Err(CliError::invalid_frame(stream, index, "timestamp is not finite"))
    }
}
