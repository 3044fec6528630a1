//! Graph edge

use contracts::TransformStatus;
use nalgebra::Matrix4;

/// One directed edge of the graph
#[derive(Debug, Clone, PartialEq)]
pub struct TransformEdge {
    /// Maps `from` coordinates to `to` coordinates
    pub matrix: Matrix4<f64>,

    pub status: TransformStatus,

    /// Derived as the inverse of the reverse edge; never set directly
    pub computed: bool,

    /// Written back to the coordinate definitions
    pub persistent: bool,

    /// Calibration date
    pub date: Option<String>,

    /// Calibration error
    pub error: Option<f64>,
}

impl TransformEdge {
    pub(crate) fn original(matrix: Matrix4<f64>, status: TransformStatus) -> Self {
        Self {
            matrix,
            status,
            computed: false,
            persistent: false,
            date: None,
            error: None,
        }
    }

    pub(crate) fn computed(matrix: Matrix4<f64>, status: TransformStatus) -> Self {
        Self {
            computed: true,
            ..Self::original(matrix, status)
        }
    }
}
