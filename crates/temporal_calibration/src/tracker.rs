//! Tracker position metric: distance of the probe from the reference origin.

use contracts::{
    translation_distance, FrameSource, StreamSummary, TransformName, TransformResolver,
};
use tracing::debug;

use crate::PositionMetric;

/// A position metric with its sample accounting
#[derive(Debug, Clone, Default)]
pub struct StreamMetric {
    pub metric: PositionMetric,
    pub summary: StreamSummary,
    /// Video only: scanlines without a usable peak
    pub discarded_scanlines: u64,
}

/// Length of the translation of `name` in every tracker frame.
///
/// Invalid frames, unresolvable transforms and transforms with an invalid
/// status are skipped.
pub fn tracker_position_metric(
    frames: &dyn FrameSource,
    name: &TransformName,
    resolver: &dyn TransformResolver,
) -> StreamMetric {
    let count = frames.frame_count();
    let mut metric = PositionMetric::with_capacity(count);
    let mut skipped = 0;

    for index in 0..count {
        let Some(frame) = frames.frame(index) else {
            skipped += 1;
            continue;
        };
        if !frame.is_valid() {
            debug!(index, timestamp = frame.timestamp(), "skipping invalid tracker frame");
            skipped += 1;
            continue;
        }

        match resolver.resolve(frame, name) {
            Some((matrix, status)) if status.is_valid() => {
                metric.push(frame.timestamp(), translation_distance(&matrix));
            }
            Some(_) => {
                debug!(index, transform = %name, "skipping tracker frame, transform is invalid");
                skipped += 1;
            }
            None => {
                debug!(index, transform = %name, "skipping tracker frame, transform is not available");
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
        discarded_scanlines: 0,
    }
}
