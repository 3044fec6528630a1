//! Layered error definitions
//!
//! Categorized by source: argument / configuration / signal / graph / io

use thiserror::Error;

/// Pipeline stage that produced a signal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStage {
    /// Tracker position metric
    Tracker,
    /// Video position metric
    Video,
}

impl std::fmt::Display for SignalStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStage::Tracker => write!(f, "tracker"),
            SignalStage::Video => write!(f, "video"),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum NavError {
    // ===== Caller Errors =====
    /// Malformed caller input (empty frame name, missing frame list, ...)
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Out-of-range calibration parameter
    #[error("invalid configuration '{field}': {message}")]
    InvalidConfiguration { field: String, message: String },

    // ===== Signal Errors =====
    /// A derived metric does not swing enough to be registered in time
    #[error("insufficient {stage} signal: {message}")]
    InsufficientSignal { stage: SignalStage, message: String },

    /// The two streams do not share a usable time window
    #[error("insufficient overlap: {message}")]
    InsufficientOverlap { message: String },

    /// Result queried before a successful update
    #[error("tracker lag has not been computed yet, call update() first")]
    NotYetComputed,

    // ===== Transform Graph Errors =====
    /// No path connects the two frames
    #[error("no transform path from '{from}' to '{to}'")]
    NotFound { from: String, to: String },

    /// Attempt to overwrite the computed inverse of a user edge
    #[error("the {from}To{to} transform is computed from {to}To{from} and cannot be set")]
    ComputedEdgeConflict { from: String, to: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NavError {
    /// Create invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create invalid configuration error
    pub fn invalid_configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create insufficient signal error
    pub fn insufficient_signal(stage: SignalStage, message: impl Into<String>) -> Self {
        Self::InsufficientSignal {
            stage,
            message: message.into(),
        }
    }

    /// Create insufficient overlap error
    pub fn insufficient_overlap(message: impl Into<String>) -> Self {
        Self::InsufficientOverlap {
            message: message.into(),
        }
    }

    /// Create no-path error
    pub fn not_found(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::NotFound {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create computed edge conflict error
    pub fn computed_edge_conflict(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::ComputedEdgeConflict {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_both_directions() {
        let err = NavError::computed_edge_conflict("Reference", "Probe");
        let msg = err.to_string();
        assert!(msg.contains("ReferenceToProbe"), "got: {msg}");
        assert!(msg.contains("ProbeToReference"), "got: {msg}");
    }

    #[test]
    fn test_signal_error_names_stage() {
        let err = NavError::insufficient_signal(SignalStage::Video, "signal is constant");
        assert_eq!(
            err.to_string(),
            "insufficient video signal: signal is constant"
        );
    }
}
