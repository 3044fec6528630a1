//! Error types for sequence loading.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Sequence file errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Sequence file not found
    #[error("Sequence file not found: {}", path.display())]
    SequenceNotFound { path: PathBuf },

    /// Sequence file parsing error
    #[error("Failed to parse sequence {}: {message}", path.display())]
    SequenceParse { path: PathBuf, message: String },

    /// Video frame image could not be read or decoded
    #[error("Failed to load image {}: {message}", path.display())]
    ImageLoad { path: PathBuf, message: String },

    /// Invalid frame content
    #[error("Invalid frame {index} in {stream} stream: {message}")]
    InvalidFrame {
        stream: &'static str,
        index: usize,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn sequence_not_found(path: &Path) -> Self {
        Self::SequenceNotFound {
            path: path.to_path_buf(),
        }
    }

    pub fn sequence_parse(path: &Path, message: impl Into<String>) -> Self {
        Self::SequenceParse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn image_load(path: &Path, message: impl Into<String>) -> Self {
        Self::ImageLoad {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn invalid_frame(stream: &'static str, index: usize, message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            stream,
            index,
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
