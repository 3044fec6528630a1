//! # Contracts
//!
//! Frozen interface contracts shared by the navigation crates: frames, names,
//! configuration documents and the unified error type.
//! Business crates depend only on this crate, never on each other.
//!
//! ## Conventions
//! - Timestamps are seconds (f64) on the acquisition clock of each stream
//! - `AToB` transforms map points from frame `A` into frame `B`
//! - Matrices are homogeneous 4x4 (`nalgebra::Matrix4<f64>`)

mod calibration_config;
mod calibration_report;
mod error;
mod frame;
mod frame_name;
mod nav_config;
mod resolver;
mod transform;

pub use calibration_config::*;
pub use calibration_report::{CalibrationReport, StreamSummary};
pub use error::*;
pub use frame::*;
pub use frame_name::FrameName;
pub use nav_config::*;
pub use resolver::{DirectTransformResolver, TransformResolver};
pub use transform::*;

pub use nalgebra::Matrix4;
