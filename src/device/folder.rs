//! Camera backed by a directory of still images.
//!
//! Each capture hands out the next file in name order, wrapping around at
//! the end. Front-facing captures are mirrored the way a selfie preview is.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::CameraDevice;
use super::info::{CameraInfo, CaptureResult, CaptureSettings, CapturedFrame, Facing};
use crate::error::{BoothError, CaptureFailure, Result};
use crate::image_ops::{encode_png, mirror};
use crate::session::lock;

/// File extensions accepted as frames.
pub const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// A camera that "captures" the images found in a directory.
#[derive(Debug)]
pub struct FolderCamera {
    info: CameraInfo,
    files: Vec<PathBuf>,
    next: AtomicUsize,
    facing: Mutex<Facing>,
}

impl FolderCamera {
    /// Open `dir` as a camera.
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::NoFramesFound`] if the directory holds no image
    /// files, or an I/O error if it cannot be read.
    pub fn open(dir: &Path) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_frame_file(path))
            .collect();
        files.sort();

        let Some(first) = files.first() else {
            return Err(BoothError::NoFramesFound {
                path: dir.display().to_string(),
            });
        };
        let (width, height) = image::image_dimensions(first)
            .map_err(|e| BoothError::ImageProcessing(format!("{}: {e}", first.display())))?;

        debug!(dir = %dir.display(), frames = files.len(), width, height, "Opened folder camera");
        Ok(Self {
            info: CameraInfo {
                id: dir.display().to_string(),
                name: format!("Folder camera ({} images)", files.len()),
                width,
                height,
            },
            files,
            next: AtomicUsize::new(0),
            facing: Mutex::new(Facing::default()),
        })
    }

    /// Start out facing `facing`.
    #[must_use]
    pub fn with_facing(self, facing: Facing) -> Self {
        *lock(&self.facing) = facing;
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn next_file(&self) -> PathBuf {
        let index = self.next.fetch_add(1, Ordering::SeqCst) % self.files.len();
        self.files[index].clone()
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Read one image file as a captured frame, mirrored when `facing` is
/// [`Facing::Front`].
///
/// # Errors
///
/// Returns [`BoothError::ImageNotFound`] for a missing file and
/// [`BoothError::ImageProcessing`] if it does not decode.
pub fn load_frame(path: &Path, facing: Facing) -> Result<CapturedFrame> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BoothError::ImageNotFound {
                path: path.display().to_string(),
            }
        } else {
            BoothError::Io(e)
        }
    })?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| BoothError::ImageProcessing(format!("{}: {e}", path.display())))?;
    let (width, height) = (img.width(), img.height());

    let bytes = match facing {
        Facing::Front => encode_png(&mirror(&img))?,
        Facing::Back => bytes,
    };
    Ok(CapturedFrame::new(bytes, width, height, facing).with_path(path))
}

#[async_trait]
impl CameraDevice for FolderCamera {
    fn info(&self) -> &CameraInfo {
        &self.info
    }

    async fn set_facing(&self, facing: Facing) -> Result<()> {
        *lock(&self.facing) = facing;
        Ok(())
    }

    #[instrument(skip(self, _settings), fields(camera = %self.info.id))]
    async fn capture_still(&self, _settings: &CaptureSettings) -> CaptureResult {
        let path = self.next_file();
        let facing = *lock(&self.facing);

        let read = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || load_frame(&path, facing)).await
        };
        match read {
            Ok(Ok(frame)) => {
                debug!(path = %path.display(), "Captured frame from folder");
                CaptureResult::Frame(frame)
            }
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "Folder frame unreadable");
                CaptureResult::Failure(CaptureFailure::Device(e.to_string()))
            }
            Err(e) => CaptureResult::Failure(CaptureFailure::Device(e.to_string())),
        }
    }
}
