//! Graph-backed [`TransformResolver`]

use contracts::{TimestampedFrame, TransformName, TransformResolver, TransformStatus};
use nalgebra::Matrix4;
use tracing::debug;

use crate::TransformGraph;

/// Resolves a named transform by loading the frame transforms into a copy
/// of a base graph and chaining edges.
///
/// With `ProbeToTracker` and `ReferenceToTracker` in each tracker frame this
/// yields `ProbeToReference`; persistent calibrations such as `ImageToProbe`
/// come from the base graph.
#[derive(Debug, Clone, Default)]
pub struct GraphTransformResolver {
    base: TransformGraph,
}

impl GraphTransformResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer frame transforms over `base`
    pub fn with_base(base: TransformGraph) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &TransformGraph {
        &self.base
    }
}

impl TransformResolver for GraphTransformResolver {
    fn resolve(
        &self,
        frame: &TimestampedFrame,
        name: &TransformName,
    ) -> Option<(Matrix4<f64>, TransformStatus)> {
        let mut graph = self.base.clone();
        if let Err(e) = graph.set_transforms_from_frame(frame) {
            debug!(timestamp = frame.timestamp(), error = %e, "frame transforms partially loaded");
        }
        graph.resolve(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{translation_matrix, FrameTransform};

    fn tracker_frame(probe_z: f64, reference_status: TransformStatus) -> TimestampedFrame {
        TimestampedFrame::tracking(
            0.0,
            vec![
                FrameTransform::new(
                    TransformName::parse("ProbeToTracker").unwrap(),
                    translation_matrix(0.0, 0.0, probe_z),
                    TransformStatus::Valid,
                ),
                FrameTransform::new(
                    TransformName::parse("ReferenceToTracker").unwrap(),
                    translation_matrix(0.0, 0.0, 100.0),
                    reference_status,
                ),
            ],
        )
    }

    #[test]
    fn test_resolves_chained_transform() {
        let resolver = GraphTransformResolver::new();
        let name = TransformName::parse("ProbeToReference").unwrap();

        let (m, status) = resolver
            .resolve(&tracker_frame(130.0, TransformStatus::Valid), &name)
            .unwrap();
        assert!((m[(2, 3)] - 30.0).abs() < 1e-9);
        assert!(status.is_valid());

        let (_, status) = resolver
            .resolve(&tracker_frame(130.0, TransformStatus::Invalid), &name)
            .unwrap();
        assert!(!status.is_valid());
    }

    #[test]
    fn test_uses_base_graph() {
        let mut base = TransformGraph::new();
        base.set_transform("Image", "Probe", Some(translation_matrix(5.0, 0.0, 0.0)), None)
            .unwrap();
        let resolver = GraphTransformResolver::with_base(base);
        let name = TransformName::parse("ImageToReference").unwrap();

        let (m, _) = resolver
            .resolve(&tracker_frame(100.0, TransformStatus::Valid), &name)
            .unwrap();
        assert!((m[(0, 3)] - 5.0).abs() < 1e-9);
        assert!(m[(2, 3)].abs() < 1e-9);

        // Base graph is not modified by resolving
        assert_eq!(resolver.base().edge_count(), 2);
    }

    #[test]
    fn test_unresolvable_returns_none() {
        let resolver = GraphTransformResolver::new();
        let name = TransformName::parse("StylusToReference").unwrap();
        assert!(resolver
            .resolve(&tracker_frame(0.0, TransformStatus::Valid), &name)
            .is_none());
    }
}
