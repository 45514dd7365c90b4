//! Off-screen strip rendering.
//!
//! A [`StripScene`] describes what goes on the strip; a [`Rasterizer`] turns
//! it into one PNG that exists both as a file and as base64 text.

mod raster;
pub mod mock;

pub use raster::{ImageRasterizer, render_scene};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::image_ops::load_image;
use crate::layout::StripLayout;
use crate::session::StripFrames;

/// The fixed logo drawn on every strip.
#[derive(Clone)]
pub struct LogoAsset {
    image: Arc<DynamicImage>,
    source: Option<PathBuf>,
}

impl LogoAsset {
    /// Load a logo from an image file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not a decodable image.
    pub fn load(path: &Path) -> Result<Self> {
        let image = load_image(path)?;
        debug!(path = %path.display(), dims = ?image.dimensions(), "Loaded logo");
        Ok(Self {
            image: Arc::new(image),
            source: Some(path.to_path_buf()),
        })
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
            source: None,
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl fmt::Debug for LogoAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoAsset")
            .field("dims", &self.image.dimensions())
            .field("source", &self.source)
            .finish()
    }
}

/// Everything needed to draw one strip.
#[derive(Debug, Clone)]
pub struct StripScene {
    pub layout: StripLayout,
    pub frames: StripFrames,
    pub logo: Option<LogoAsset>,
    pub background: [u8; 3],
}

/// A rasterized strip.
///
/// `path` holds exactly the PNG bytes that `encoded` holds as base64.
#[derive(Debug, Clone, Serialize)]
pub struct RasterOutput {
    pub path: PathBuf,
    #[serde(skip)]
    pub encoded: String,
    pub width: u32,
    pub height: u32,
    /// Hex SHA-256 of the PNG bytes.
    pub digest: String,
}

/// Turns a scene into pixels.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Resolves to `true` once the scene is laid out and safe to snapshot.
    ///
    /// Callers bound the wait; a backend that never acknowledges is
    /// rasterized anyway after the caller's fallback delay.
    async fn layout_ready(&self, _scene: &StripScene) -> bool {
        true
    }

    /// Render the scene to a PNG file and its base64 encoding.
    ///
    /// Either both forms are produced or neither is: on error no output file
    /// may be left behind.
    async fn rasterize(&self, scene: &StripScene) -> Result<RasterOutput>;
}

/// Shared handle to a rasterizer.
pub type SharedRasterizer = Arc<dyn Rasterizer>;
