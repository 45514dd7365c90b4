//! Camera and frame types shared by camera implementations.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{BoothError, CaptureFailure, Result};

/// Which way the active camera points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Front,
    #[default]
    Back,
}

impl Facing {
    /// The opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Front => "front",
            Self::Back => "back",
        })
    }
}

/// Information about a camera.
#[derive(Debug, Clone, Serialize)]
pub struct CameraInfo {
    /// Stable identifier (device id, directory, or mock name)
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Native still resolution
    pub width: u32,
    pub height: u32,
}

/// Options passed to every still capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Encoder quality in `0.0..=1.0`.
    pub quality: f32,
    /// Return the encoded payload alongside any file location.
    pub include_encoded: bool,
    /// Keep EXIF metadata.
    pub exif: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            quality: 1.0,
            include_encoded: true,
            exif: false,
        }
    }
}

/// One still image returned by a camera.
///
/// The payload is shared, so clones are cheap and a frame can move from the
/// sequencer to the compositor without copying pixels.
#[derive(Clone)]
pub struct CapturedFrame {
    bytes: Arc<[u8]>,
    path: Option<PathBuf>,
    width: u32,
    height: u32,
    facing: Facing,
    captured_at: DateTime<Utc>,
}

impl CapturedFrame {
    /// Wrap an encoded image payload.
    pub fn new(bytes: impl Into<Arc<[u8]>>, width: u32, height: u32, facing: Facing) -> Self {
        Self {
            bytes: bytes.into(),
            path: None,
            width,
            height,
            facing,
            captured_at: Utc::now(),
        }
    }

    /// Attach the transient file the camera wrote the frame to.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Encoded image payload (PNG or JPEG).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub const fn facing(&self) -> Facing {
        self.facing
    }

    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Decode the payload into pixels.
    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory(&self.bytes)
            .map_err(|e| BoothError::ImageProcessing(format!("undecodable frame: {e}")))
    }
}

impl fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("bytes", &self.bytes.len())
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("facing", &self.facing)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Outcome of a single still capture.
#[derive(Debug, Clone)]
pub enum CaptureResult {
    Frame(CapturedFrame),
    Failure(CaptureFailure),
}

impl CaptureResult {
    pub const fn is_frame(&self) -> bool {
        matches!(self, Self::Frame(_))
    }
}

impl From<CapturedFrame> for CaptureResult {
    fn from(frame: CapturedFrame) -> Self {
        Self::Frame(frame)
    }
}

impl From<CaptureFailure> for CaptureResult {
    fn from(failure: CaptureFailure) -> Self {
        Self::Failure(failure)
    }
}
