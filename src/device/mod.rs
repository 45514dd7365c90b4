//! Camera abstraction layer.
//!
//! This module provides a trait-based abstraction over camera backends,
//! so the capture sequencer can be driven by a folder of images on a desktop
//! kiosk or by a scripted mock in tests.

mod folder;
mod info;
pub mod mock;

pub use folder::{FRAME_EXTENSIONS, FolderCamera, load_frame};
pub use info::{CameraInfo, CaptureResult, CaptureSettings, CapturedFrame, Facing};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Core camera operations.
///
/// Implementations must be safe to share between the controller and any
/// observer tasks, and must never block the async runtime for long.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Camera information.
    fn info(&self) -> &CameraInfo;

    /// Point the camera the given way.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot switch direction.
    async fn set_facing(&self, facing: Facing) -> Result<()>;

    /// Take one still picture.
    ///
    /// Failure is reported in-band as [`CaptureResult::Failure`] so every
    /// round has to handle it explicitly.
    async fn capture_still(&self, settings: &CaptureSettings) -> CaptureResult;
}

/// Shared handle to a camera.
pub type SharedCamera = Arc<dyn CameraDevice>;
