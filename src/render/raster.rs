//! Strip rasterization with the `image` crate.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops;
use image::{DynamicImage, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

use super::{RasterOutput, Rasterizer, StripScene};
use crate::error::{BoothError, Result};
use crate::image_ops::{ResizeStrategy, encode_png, resize_into};

/// Renders strips in memory and writes them under `out_dir`.
#[derive(Debug, Clone)]
pub struct ImageRasterizer {
    out_dir: PathBuf,
}

impl ImageRasterizer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Rasterizer writing to the system temp directory.
    pub fn temp() -> Self {
        Self::new(std::env::temp_dir().join("photobooth"))
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

#[async_trait]
impl Rasterizer for ImageRasterizer {
    async fn rasterize(&self, scene: &StripScene) -> Result<RasterOutput> {
        let scene = scene.clone();
        let out_dir = self.out_dir.clone();
        tokio::task::spawn_blocking(move || rasterize_to_file(&scene, &out_dir))
            .await
            .map_err(|e| BoothError::Build(format!("render task failed: {e}")))?
    }
}

/// Draw the scene into an RGBA canvas.
///
/// # Errors
///
/// Returns [`BoothError::Build`] if a frame cannot be decoded.
pub fn render_scene(scene: &StripScene) -> Result<RgbaImage> {
    let layout = &scene.layout;
    let (width, height) = layout.pixel_size();
    let [r, g, b] = scene.background;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]));

    for (index, frame) in scene.frames.iter().enumerate() {
        let rect = layout.frame_rect(index).scaled(layout.scale);
        let img = frame
            .decode()
            .map_err(|e| BoothError::Build(format!("frame {}: {e}", index + 1)))?;
        let tile = resize_into(&img, rect.width, rect.height, layout.frame_fit);
        imageops::overlay(&mut canvas, &tile, rect.x.into(), rect.y.into());
        trace!(index, ?rect, "Placed frame");
    }

    if let Some(logo) = &scene.logo {
        let rect = layout.logo_rect().scaled(layout.scale);
        let tile = resize_into(logo.image(), rect.width, rect.height, ResizeStrategy::Fit);
        imageops::overlay(&mut canvas, &tile, rect.x.into(), rect.y.into());
        trace!(?rect, "Placed logo");
    }

    Ok(canvas)
}

#[instrument(skip(scene), fields(out_dir = %out_dir.display()))]
fn rasterize_to_file(scene: &StripScene, out_dir: &Path) -> Result<RasterOutput> {
    let canvas = render_scene(scene)?;
    let (width, height) = canvas.dimensions();
    let bytes = encode_png(&DynamicImage::ImageRgba8(canvas))
        .map_err(|e| BoothError::Build(e.to_string()))?;

    let digest = hex::encode(Sha256::digest(&bytes));
    let encoded = STANDARD.encode(&bytes);
    let path = write_atomically(out_dir, &format!("strip-{}.png", Uuid::new_v4()), &bytes)?;

    debug!(
        path = %path.display(),
        width,
        height,
        bytes = bytes.len(),
        "Strip rasterized"
    );
    Ok(RasterOutput {
        path,
        encoded,
        width,
        height,
        digest,
    })
}

/// Write `bytes` to `dir/name` via a temporary file so a reader never sees a
/// partial image and a failed write leaves nothing behind.
pub(crate) fn write_atomically(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| {
        BoothError::Build(format!("cannot create {}: {e}", dir.display()))
    })?;

    let final_path = dir.join(name);
    let part_path = dir.join(format!(".{name}.part"));

    let written = fs::write(&part_path, bytes).and_then(|()| fs::rename(&part_path, &final_path));
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&part_path) {
            warn!(path = %part_path.display(), error = %cleanup, "Could not remove partial file");
        }
        return Err(BoothError::Build(format!(
            "cannot write {}: {e}",
            final_path.display()
        )));
    }
    Ok(final_path)
}
