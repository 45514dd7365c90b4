//! Mock camera implementation for unit testing.
//!
//! This module provides a mock camera that records all operations,
//! returns solid-color test frames, and can be scripted to fail or stall
//! on specific shots.
//!
//! # Example
//!
//! ```rust,ignore
//! use booth::device::mock::{MockCamera, MockShot, Operation};
//!
//! let camera = MockCamera::new().script(2, MockShot::NoResult);
//! // The sequencer's second capture will come back empty.
//! ```

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio::time::Instant;
use tracing::{debug, trace};

use super::info::{CameraInfo, CaptureResult, CaptureSettings, CapturedFrame, Facing};
use super::CameraDevice;
use crate::error::{BoothError, CaptureFailure, Result};

/// Colors handed out to successive test frames, so composited strips show
/// which shot landed where.
pub const SHOT_COLORS: [[u8; 3]; 4] = [
    [220, 40, 40],
    [40, 180, 60],
    [40, 80, 220],
    [230, 200, 30],
];

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    SetFacing { facing: Facing },
    CaptureStill { shot: usize },
}

/// Scripted behavior for one capture call.
#[derive(Debug, Clone)]
pub enum MockShot {
    /// Return a solid-color frame.
    Frame,
    /// Return no picture.
    NoResult,
    /// Return a device error.
    Error(String),
    /// Never answer (exercises capture timeouts).
    Hang,
}

/// Mock camera for testing without hardware.
pub struct MockCamera {
    info: CameraInfo,
    facing: Mutex<Facing>,
    script: Mutex<HashMap<usize, MockShot>>,
    capture_delay: Duration,
    facing_delay: Duration,
    shots: AtomicUsize,
    operation_log: Mutex<Vec<Operation>>,
    capture_times: Mutex<Vec<Instant>>,
    facing_error: Mutex<Option<BoothError>>,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    /// Create a mock camera producing 320x240 frames.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolution(320, 240)
    }

    /// Create a mock camera with a specific still resolution.
    #[must_use]
    pub fn with_resolution(width: u32, height: u32) -> Self {
        debug!(width, height, "Creating mock camera");
        Self {
            info: CameraInfo {
                id: "MOCK-CAMERA-001".to_string(),
                name: "Mock Camera".to_string(),
                width,
                height,
            },
            facing: Mutex::new(Facing::default()),
            script: Mutex::new(HashMap::new()),
            capture_delay: Duration::ZERO,
            facing_delay: Duration::ZERO,
            shots: AtomicUsize::new(0),
            operation_log: Mutex::new(Vec::new()),
            capture_times: Mutex::new(Vec::new()),
            facing_error: Mutex::new(None),
        }
    }

    // === Configuration ===

    /// Script the behavior of the `shot`-th capture (1-based, counted over
    /// the camera's lifetime).
    #[must_use]
    pub fn script(self, shot: usize, behavior: MockShot) -> Self {
        self.script.lock().unwrap().insert(shot, behavior);
        self
    }

    /// Delay every capture by `delay`.
    #[must_use]
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    /// Delay every facing switch by `delay`.
    #[must_use]
    pub fn with_facing_delay(mut self, delay: Duration) -> Self {
        self.facing_delay = delay;
        self
    }

    /// Make the next `set_facing` call fail.
    pub fn inject_facing_error(&self, error: BoothError) {
        *self.facing_error.lock().unwrap() = Some(error);
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Number of capture calls made so far.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.shots.load(Ordering::SeqCst)
    }

    /// Instants at which each capture call started.
    #[must_use]
    pub fn capture_times(&self) -> Vec<Instant> {
        self.capture_times.lock().unwrap().clone()
    }

    /// Current facing as last set.
    #[must_use]
    pub fn facing(&self) -> Facing {
        *self.facing.lock().unwrap()
    }

    // === Internal Helpers ===

    fn record_op(&self, op: Operation) {
        trace!(?op, "Recording operation");
        self.operation_log.lock().unwrap().push(op);
    }

    fn frame_for(&self, shot: usize) -> CaptureResult {
        let color = SHOT_COLORS[(shot - 1) % SHOT_COLORS.len()];
        match solid_frame(self.info.width, self.info.height, color, self.facing()) {
            Ok(frame) => CaptureResult::Frame(frame),
            Err(e) => CaptureResult::Failure(CaptureFailure::Device(e.to_string())),
        }
    }
}

#[async_trait]
impl CameraDevice for MockCamera {
    fn info(&self) -> &CameraInfo {
        &self.info
    }

    async fn set_facing(&self, facing: Facing) -> Result<()> {
        if !self.facing_delay.is_zero() {
            tokio::time::sleep(self.facing_delay).await;
        }
        if let Some(error) = self.facing_error.lock().unwrap().take() {
            return Err(error);
        }
        self.record_op(Operation::SetFacing { facing });
        *self.facing.lock().unwrap() = facing;
        Ok(())
    }

    async fn capture_still(&self, _settings: &CaptureSettings) -> CaptureResult {
        let shot = self.shots.fetch_add(1, Ordering::SeqCst) + 1;
        self.capture_times.lock().unwrap().push(Instant::now());
        self.record_op(Operation::CaptureStill { shot });

        if !self.capture_delay.is_zero() {
            tokio::time::sleep(self.capture_delay).await;
        }

        let behavior = self
            .script
            .lock()
            .unwrap()
            .get(&shot)
            .cloned()
            .unwrap_or(MockShot::Frame);

        match behavior {
            MockShot::Frame => self.frame_for(shot),
            MockShot::NoResult => CaptureResult::Failure(CaptureFailure::NoResult),
            MockShot::Error(message) => CaptureResult::Failure(CaptureFailure::Device(message)),
            MockShot::Hang => std::future::pending().await,
        }
    }
}

/// Encode a solid-color PNG frame.
pub fn solid_frame(width: u32, height: u32, color: [u8; 3], facing: Facing) -> Result<CapturedFrame> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| BoothError::ImageProcessing(e.to_string()))?;
    Ok(CapturedFrame::new(buf.into_inner(), width, height, facing))
}
