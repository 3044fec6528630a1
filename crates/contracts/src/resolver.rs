//! TransformResolver trait - named transform lookup for a frame
//!
//! Decouples consumers of tracker frames (temporal calibration) from the way a
//! transform is obtained. The direct resolver only looks at what the frame
//! carries; the transform graph crate provides a resolver that chains edges.

use nalgebra::Matrix4;

use crate::{TimestampedFrame, TransformName, TransformStatus};

/// Resolve a named transform for one frame
pub trait TransformResolver {
    /// Matrix and status of `name` at this frame, or `None` when the frame
    /// does not provide enough information to compute it.
    fn resolve(
        &self,
        frame: &TimestampedFrame,
        name: &TransformName,
    ) -> Option<(Matrix4<f64>, TransformStatus)>;
}

/// Looks the name up among the frame transforms, falling back to inverting the
/// reverse direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectTransformResolver;

impl TransformResolver for DirectTransformResolver {
    fn resolve(
        &self,
        frame: &TimestampedFrame,
        name: &TransformName,
    ) -> Option<(Matrix4<f64>, TransformStatus)> {
        if let Some(t) = frame.transform(name) {
            return Some((t.matrix, t.status));
        }
        let reverse = frame.transform(&name.inverse())?;
        let inverse = reverse.matrix.try_inverse()?;
        Some((inverse, reverse.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{translation_matrix, FrameTransform};

    #[test]
    fn test_direct_and_inverse_lookup() {
        let name = TransformName::parse("ProbeToReference").unwrap();
        let frame = TimestampedFrame::tracking(
            0.0,
            vec![FrameTransform::new(
                name.clone(),
                translation_matrix(0.0, 0.0, 5.0),
                TransformStatus::Invalid,
            )],
        );

        let resolver = DirectTransformResolver;
        let (m, status) = resolver.resolve(&frame, &name).unwrap();
        assert_eq!(m[(2, 3)], 5.0);
        assert_eq!(status, TransformStatus::Invalid);

        let (inv, _) = resolver.resolve(&frame, &name.inverse()).unwrap();
        assert!((inv[(2, 3)] + 5.0).abs() < 1e-12);

        let other = TransformName::parse("StylusToReference").unwrap();
        assert!(resolver.resolve(&frame, &other).is_none());
    }
}
