//! Image processing operations.

use std::io::Cursor;
use std::path::Path;

use clap::ValueEnum;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{BoothError, Result};

/// Strategy for scaling an image into a fixed box.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeStrategy {
    /// Fit within the box, maintain aspect ratio (transparent bars).
    Fit,
    /// Fill the box, maintain aspect ratio (may crop).
    #[default]
    Fill,
    /// Stretch to fill (may distort).
    Stretch,
}

const FILTER: FilterType = FilterType::Lanczos3;

/// Load an image file.
///
/// # Errors
///
/// Returns an error if the file is missing or cannot be decoded.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(BoothError::ImageNotFound {
            path: path.display().to_string(),
        });
    }

    image::open(path).map_err(|e| BoothError::ImageProcessing(format!("{}: {e}", path.display())))
}

/// Scale `img` into a `width` x `height` RGBA image according to `strategy`.
///
/// The result always has exactly the requested dimensions. With
/// [`ResizeStrategy::Fit`] the scaled image is centered on a transparent
/// canvas so whatever it is later drawn onto shows through the bars.
pub fn resize_into(
    img: &DynamicImage,
    width: u32,
    height: u32,
    strategy: ResizeStrategy,
) -> RgbaImage {
    match strategy {
        ResizeStrategy::Fit => {
            let scaled = img.resize(width, height, FILTER).to_rgba8();
            let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
            let (sw, sh) = scaled.dimensions();
            let x = (width - sw) / 2;
            let y = (height - sh) / 2;
            imageops::overlay(&mut canvas, &scaled, x.into(), y.into());
            canvas
        }
        ResizeStrategy::Fill => img.resize_to_fill(width, height, FILTER).to_rgba8(),
        ResizeStrategy::Stretch => img.resize_exact(width, height, FILTER).to_rgba8(),
    }
}

/// Mirror an image left-to-right, as a front camera preview shows it.
pub fn mirror(img: &DynamicImage) -> DynamicImage {
    img.fliph()
}

/// Encode an image as PNG bytes.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| BoothError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Parse a `#rrggbb` (or `rrggbb`) color.
///
/// # Errors
///
/// Returns [`BoothError::InvalidColor`] on malformed input.
pub fn parse_color(s: &str) -> Result<[u8; 3]> {
    let hex_str = s.trim().trim_start_matches('#');
    if hex_str.len() != 6 {
        return Err(BoothError::InvalidColor(s.to_string()));
    }

    let mut rgb = [0_u8; 3];
    hex::decode_to_slice(hex_str, &mut rgb).map_err(|_| BoothError::InvalidColor(s.to_string()))?;
    Ok(rgb)
}

/// Format a color as `#rrggbb`.
pub fn format_color(rgb: [u8; 3]) -> String {
    format!("#{}", hex::encode(rgb))
}
