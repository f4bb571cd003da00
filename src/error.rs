//! Error types for the Goldenrun harness

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Shape of a pixel grid as `(height, width, channels)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// Number of rows
    pub height: usize,
    /// Number of columns
    pub width: usize,
    /// Samples per pixel
    pub channels: usize,
}

impl Shape {
    /// Create a new shape
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Total number of samples in a grid of this shape
    pub fn num_samples(&self) -> usize {
        self.height * self.width * self.channels
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.height, self.width, self.channels)
    }
}

/// Broad classification of an [`Error`].
///
/// The runner only treats [`ErrorCategory::TestFailure`] as part of a normal
/// run; the other categories abort the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing prerequisites or bad configuration, detected before tests run
    Setup,
    /// A single test did not meet its expectations
    TestFailure,
    /// The report store could not be read or written
    Persistence,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Setup => write!(f, "setup"),
            ErrorCategory::TestFailure => write!(f, "test failure"),
            ErrorCategory::Persistence => write!(f, "persistence"),
        }
    }
}

/// Main error type for Goldenrun
#[derive(Error, Debug)]
pub enum Error {
    // ── Setup errors ─────────────────────────────────────────────────

    /// A path required by a suite does not exist
    #[error("{what} does not exist: {}", path.display())]
    MissingPath { what: String, path: PathBuf },

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Suite manifest could not be parsed
    #[error("Manifest error in {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    // ── Per-test failures ────────────────────────────────────────────

    /// Generic test failure with details
    #[error("{0}")]
    TestFailure(String),

    /// External decoder returned a non-zero exit status
    #[error("Decoder exited with non-zero code {}", code.map(|c| c.to_string()).unwrap_or_else(|| "(terminated by signal)".to_string()))]
    DecoderExit { code: Option<i32>, output: String },

    /// External decoder did not produce exactly one output file
    #[error("Decoder produced {count} output files in {}, expected exactly 1", dir.display())]
    DecoderOutputCount { count: usize, dir: PathBuf },

    /// Input media file for a test is missing
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Image file does not exist
    #[error("Image file not found: {}", path.display())]
    ImageNotFound { path: PathBuf },

    /// Image file exists but could not be decoded
    #[error("Failed to decode image {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Actual and reference grids differ in shape
    #[error("Mismatch in actual and reference shape {actual} vs {reference}")]
    ShapeMismatch { actual: Shape, reference: Shape },

    /// Too many samples exceeded the per-sample threshold
    #[error("Too many failed pixel values: {num_failed} at threshold {num_accepted}")]
    TooManyFailedSamples { num_failed: usize, num_accepted: usize },

    // ── Persistence errors ───────────────────────────────────────────

    /// IO error
    #[error("IOError: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Result document (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image could not be encoded or written
    #[error("Failed to encode image {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
}

impl Error {
    /// Create a generic test failure
    pub fn test_failure(details: impl Into<String>) -> Self {
        Error::TestFailure(details.into())
    }

    /// Create a missing-path setup error
    pub fn missing_path(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::MissingPath {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingPath { .. } | Error::Config(_) | Error::Manifest { .. } => {
                ErrorCategory::Setup
            }

            Error::TestFailure(_)
            | Error::DecoderExit { .. }
            | Error::DecoderOutputCount { .. }
            | Error::InputNotFound { .. }
            | Error::ImageNotFound { .. }
            | Error::Decode { .. }
            | Error::ShapeMismatch { .. }
            | Error::TooManyFailedSamples { .. } => ErrorCategory::TestFailure,

            Error::Io { .. } | Error::Json(_) | Error::Encode { .. } => {
                ErrorCategory::Persistence
            }
        }
    }

    /// Whether this error is a recoverable per-test failure
    pub fn is_test_failure(&self) -> bool {
        self.category() == ErrorCategory::TestFailure
    }

    /// Combined stdout/stderr of a failed decoder run, if any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Error::DecoderExit { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

/// Result type alias for Goldenrun
pub type Result<T> = std::result::Result<T, Error>;
