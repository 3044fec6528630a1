//! NavConfig - Config Loader output
//!
//! The configuration document: temporal calibration parameters and the
//! persistent coordinate frame transforms.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{FrameName, MatrixRows, TemporalCalibrationConfig, TransformStatus};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NavConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Temporal calibration parameters
    #[serde(default)]
    #[validate(nested)]
    pub temporal_calibration: TemporalCalibrationConfig,

    /// Transforms known before any device is connected
    #[serde(default)]
    pub coordinate_definitions: CoordinateDefinitions,
}

/// Coordinate frame definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateDefinitions {
    #[serde(default)]
    pub transforms: Vec<TransformDefinition>,
}

/// One user-set transform as stored in the configuration tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformDefinition {
    pub from: FrameName,
    pub to: FrameName,

    /// Row-major homogeneous matrix
    pub matrix: MatrixRows,

    #[serde(default)]
    pub status: TransformStatus,

    /// Written back when the configuration is saved
    #[serde(default = "default_persistent")]
    pub persistent: bool,

    /// Calibration date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Calibration error (application-defined unit, usually mm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<f64>,
}

fn default_persistent() -> bool {
    true
}
