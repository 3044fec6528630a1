//! TimestampedFrame - Frame source output
//!
//! One captured sample of either the tracker stream (named transforms) or the
//! ultrasound video stream (an image).

use std::borrow::Cow;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{FrameTransform, NavError, TransformName};

/// A captured frame
///
/// Immutable once built; owned by the [`FrameList`] holding it.
#[derive(Debug, Clone)]
pub struct TimestampedFrame {
    /// Acquisition time (seconds); monotonic within a stream, not evenly spaced
    timestamp: f64,

    /// Frame-level validity reported by the acquisition device
    valid: bool,

    payload: FramePayload,
}

/// Frame payload
#[derive(Debug, Clone)]
pub enum FramePayload {
    /// Ultrasound video frame
    Image(ImageData),

    /// Tracker sample: every tool transform known at this instant
    Tracking(Vec<FrameTransform>),
}

impl TimestampedFrame {
    /// Video frame
    pub fn image(timestamp: f64, image: ImageData) -> Self {
        Self {
            timestamp,
            valid: true,
            payload: FramePayload::Image(image),
        }
    }

    /// Tracker frame
    pub fn tracking(timestamp: f64, transforms: Vec<FrameTransform>) -> Self {
        Self {
            timestamp,
            valid: true,
            payload: FramePayload::Tracking(transforms),
        }
    }

    /// Override the frame validity flag
    pub fn with_validity(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    #[inline]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn payload(&self) -> &FramePayload {
        &self.payload
    }

    /// Image, if this is a video frame
    pub fn image_data(&self) -> Option<&ImageData> {
        match &self.payload {
            FramePayload::Image(image) => Some(image),
            FramePayload::Tracking(_) => None,
        }
    }

    /// All transforms carried by a tracker frame (empty for video frames)
    pub fn transforms(&self) -> &[FrameTransform] {
        match &self.payload {
            FramePayload::Tracking(transforms) => transforms,
            FramePayload::Image(_) => &[],
        }
    }

    /// Direct lookup of a transform stored under exactly this name
    pub fn transform(&self, name: &TransformName) -> Option<&FrameTransform> {
        self.transforms().iter().find(|t| &t.name == name)
    }
}

/// Image data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Image width (pixels)
    pub width: u32,

    /// Image height (pixels)
    pub height: u32,

    /// Pixel format
    pub format: ImageFormat,

    /// Raw row-major pixel data
    pub data: Bytes,
}

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Gray8,
    Rgb8,
    Rgba8,
    Bgra8,
}

impl ImageFormat {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            ImageFormat::Gray8 => 1,
            ImageFormat::Rgb8 => 3,
            ImageFormat::Rgba8 | ImageFormat::Bgra8 => 4,
        }
    }
}

/// Single-channel 8-bit view of an image
#[derive(Debug, Clone)]
pub struct IntensityImage<'a> {
    pub width: usize,
    pub height: usize,
    pixels: Cow<'a, [u8]>,
}

impl<'a> IntensityImage<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// Intensity profile of column `x`, top to bottom
    pub fn column(&self, x: usize) -> Vec<u8> {
        (0..self.height).map(|y| self.get(x, y)).collect()
    }
}

impl ImageData {
    /// 8-bit grey image
    pub fn gray8(width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            format: ImageFormat::Gray8,
            data: data.into(),
        }
    }

    /// Convert to an intensity plane, dispatching once on the pixel format.
    ///
    /// Grey images are borrowed; colour images are reduced to luma
    /// (ITU-R BT.601 weights).
    ///
    /// # Errors
    /// `InvalidArgument` when the buffer length does not match the dimensions.
    pub fn intensity(&self) -> Result<IntensityImage<'_>, NavError> {
        let width = self.width as usize;
        let height = self.height as usize;
        let channels = self.format.channels();
        let expected = width * height * channels;
        if self.data.len() != expected {
            return Err(NavError::invalid_argument(format!(
                "image buffer holds {} bytes, {}x{} {:?} needs {}",
                self.data.len(),
                width,
                height,
                self.format,
                expected
            )));
        }

        let luma = |r: u8, g: u8, b: u8| -> u8 {
            (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u8
        };

        let pixels = match self.format {
            ImageFormat::Gray8 => Cow::Borrowed(self.data.as_ref()),
            ImageFormat::Rgb8 | ImageFormat::Rgba8 => Cow::Owned(
                self.data
                    .chunks_exact(channels)
                    .map(|px| luma(px[0], px[1], px[2]))
                    .collect(),
            ),
            ImageFormat::Bgra8 => Cow::Owned(
                self.data
                    .chunks_exact(channels)
                    .map(|px| luma(px[2], px[1], px[0]))
                    .collect(),
            ),
        };

        Ok(IntensityImage {
            width,
            height,
            pixels,
        })
    }
}

/// Ordered, random-access frame sequence
pub trait FrameSource {
    /// Number of frames
    fn frame_count(&self) -> usize;

    /// Frame at `index`
    fn frame(&self, index: usize) -> Option<&TimestampedFrame>;

    fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }
}

/// Owned list of frames
#[derive(Debug, Clone, Default)]
pub struct FrameList {
    frames: Vec<TimestampedFrame>,
}

impl FrameList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: TimestampedFrame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimestampedFrame> {
        self.frames.iter()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl FrameSource for FrameList {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame(&self, index: usize) -> Option<&TimestampedFrame> {
        self.frames.get(index)
    }
}

impl From<Vec<TimestampedFrame>> for FrameList {
    fn from(frames: Vec<TimestampedFrame>) -> Self {
        Self { frames }
    }
}

impl FromIterator<TimestampedFrame> for FrameList {
    fn from_iter<I: IntoIterator<Item = TimestampedFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FrameList {
    type Item = &'a TimestampedFrame;
    type IntoIter = std::slice::Iter<'a, TimestampedFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{translation_matrix, TransformStatus};

    #[test]
    fn test_gray_image_is_borrowed() {
        let image = ImageData::gray8(2, 2, vec![0u8, 10, 20, 30]);
        let plane = image.intensity().unwrap();
        assert!(matches!(plane.pixels, Cow::Borrowed(_)));
        assert_eq!(plane.get(1, 1), 30);
        assert_eq!(plane.column(0), vec![0, 20]);
    }

    #[test]
    fn test_rgb_converted_to_luma() {
        let image = ImageData {
            width: 1,
            height: 2,
            format: ImageFormat::Rgb8,
            data: Bytes::from(vec![255u8, 255, 255, 0, 0, 0]),
        };
        let plane = image.intensity().unwrap();
        assert_eq!(plane.column(0), vec![255, 0]);
    }

    #[test]
    fn test_bgra_channel_order() {
        // Pure blue in BGRA
        let image = ImageData {
            width: 1,
            height: 1,
            format: ImageFormat::Bgra8,
            data: Bytes::from(vec![255u8, 0, 0, 255]),
        };
        let plane = image.intensity().unwrap();
        assert_eq!(plane.get(0, 0), 29);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let image = ImageData::gray8(4, 4, vec![0u8; 3]);
        assert!(matches!(
            image.intensity(),
            Err(NavError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_tracking_frame_lookup() {
        let name = TransformName::parse("ProbeToTracker").unwrap();
        let frame = TimestampedFrame::tracking(
            1.5,
            vec![FrameTransform::new(
                name.clone(),
                translation_matrix(1.0, 0.0, 0.0),
                TransformStatus::Valid,
            )],
        );
        assert!(frame.transform(&name).is_some());
        assert!(frame.transform(&name.inverse()).is_none());
        assert!(frame.image_data().is_none());
    }

    #[test]
    fn test_frame_list_source() {
        let list: FrameList = (0..3)
            .map(|i| TimestampedFrame::tracking(i as f64, Vec::new()))
            .collect();
        assert_eq!(list.frame_count(), 3);
        assert_eq!(list.frame(2).map(|f| f.timestamp()), Some(2.0));
        assert!(list.frame(3).is_none());
    }
}
