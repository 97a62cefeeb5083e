//! Error types for the camera position estimator.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An input source could not be opened
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An input source was opened but its content is unusable
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Fewer 2D/3D correspondences than the solve needs
    #[error("Insufficient correspondences: {required} required, {provided} provided")]
    InsufficientCorrespondences {
        /// Number of correspondences needed
        required: usize,
        /// Number of correspondences actually available
        provided: usize,
    },

    /// Point configuration does not constrain a unique pose
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Output destination could not be written
    #[error("Failed to write {}: {reason}", path.display())]
    WriteFailure {
        /// Destination that failed
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Build a [`Error::WriteFailure`] for `path`.
    pub fn write_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::WriteFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
