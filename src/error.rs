//! Error types for photobooth operations.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Why a single capture round produced no frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureFailure {
    #[error("camera returned no picture")]
    NoResult,

    #[error("camera error: {0}")]
    Device(String),

    #[error("camera did not respond within {}ms", .0.as_millis())]
    TimedOut(Duration),
}

/// Primary error type for photobooth operations.
#[derive(Error, Debug)]
pub enum BoothError {
    // Capture errors
    #[error("Capture failed on shot {shot}: {cause}")]
    Capture { shot: usize, cause: CaptureFailure },

    #[error("Expected exactly {expected} frames, got {actual}")]
    IncompleteSequence { expected: usize, actual: usize },

    #[error("No frames found in {path}")]
    NoFramesFound { path: String },

    // Composition errors
    #[error("Strip build failed: {0}")]
    Build(String),

    #[error("Invalid strip layout: {0}")]
    InvalidLayout(String),

    // Export and share errors
    #[error("No image available to export.")]
    NothingToExport,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("No image available to share.")]
    NothingToShare,

    #[error("Sharing not supported.")]
    ShareUnavailable,

    #[error("Share failed: {0}")]
    Share(String),

    #[error("Photo library permission denied")]
    PermissionDenied,

    #[error("Cannot {operation} right now: the booth is busy")]
    Busy { operation: &'static str },

    // Image errors
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Image file not found: {path}")]
    ImageNotFound { path: String },

    #[error("Unsupported image format: {0}")]
    ImageFormat(String),

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid color '{0}': expected 6 hex digits (e.g. #ffffff)")]
    InvalidColor(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse error classification for machine-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Capture,
    Build,
    Export,
    Share,
    PermissionDenied,
    Busy,
    Image,
    Config,
    Io,
    Other,
}

impl BoothError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Capture { .. } | Self::IncompleteSequence { .. } | Self::NoFramesFound { .. } => {
                ErrorKind::Capture
            }
            Self::Build(_) | Self::InvalidLayout(_) => ErrorKind::Build,
            Self::NothingToExport | Self::Export(_) => ErrorKind::Export,
            Self::NothingToShare | Self::ShareUnavailable | Self::Share(_) => ErrorKind::Share,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::Busy { .. } => ErrorKind::Busy,
            Self::ImageProcessing(_) | Self::ImageNotFound { .. } | Self::ImageFormat(_) => {
                ErrorKind::Image
            }
            Self::ConfigNotFound { .. }
            | Self::ConfigParse(_)
            | Self::ConfigInvalid(_)
            | Self::InvalidColor(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Capture { .. }
                | Self::Build(_)
                | Self::NothingToExport
                | Self::NothingToShare
                | Self::ShareUnavailable
                | Self::Busy { .. }
                | Self::NoFramesFound { .. }
                | Self::ImageNotFound { .. }
                | Self::ConfigNotFound { .. }
                | Self::InvalidColor(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Capture { .. } => Some("Retake the photos to start a new strip"),
            Self::Build(_) => Some("Retake the photos to rebuild the strip"),
            Self::NothingToExport | Self::NothingToShare => {
                Some("Wait for the strip to finish building")
            }
            Self::ShareUnavailable => Some("Set output.share_dir in the configuration"),
            Self::Busy { .. } => Some("Wait for the current operation to finish"),
            Self::NoFramesFound { .. } => Some("Point --from at a directory of PNG or JPEG files"),
            Self::ConfigNotFound { .. } => Some("Run: booth init"),
            Self::InvalidColor(_) => Some("Use a color like #ffffff"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using BoothError.
pub type Result<T> = std::result::Result<T, BoothError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| BoothError::Other(format!("{}: {e}", f().into())))
    }
}
