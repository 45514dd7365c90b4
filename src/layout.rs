//! Photo-strip geometry.
//!
//! All positions are derived from a handful of constants. The canvas width
//! follows the frame width plus margins; the canvas height follows from the
//! fixed strip aspect ratio, never from the content drawn into it.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{BoothError, Result};
use crate::image_ops::ResizeStrategy;

/// Number of shots in one strip.
pub const SHOTS_PER_STRIP: usize = 4;

/// Printed strip proportions (2.125in x 5.5in at 300dpi).
pub const STRIP_ASPECT: f64 = 637.5 / 1650.0;

/// Where the logo sits on the strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoAnchor {
    /// Flush with the bottom edge of the canvas, drawn over anything beneath.
    #[default]
    Bottom,
    /// Centered in the free space under the last frame, shrunk to fit.
    Footer,
}

/// An axis-aligned box in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Multiply every coordinate by `factor`.
    pub const fn scaled(&self, factor: u32) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

/// Strip layout parameters, in layout units (pixels at scale 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripLayout {
    pub photo_width: u32,
    pub photo_height: u32,
    /// Gap between consecutive frames.
    pub padding: u32,
    /// Inset on every side of the canvas.
    pub margin: u32,
    pub logo_width: u32,
    pub logo_height: u32,
    pub logo_anchor: LogoAnchor,
    /// How frames are scaled into their boxes.
    pub frame_fit: ResizeStrategy,
    /// Output pixels per layout unit.
    pub scale: u32,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            photo_width: 200,
            photo_height: 125,
            padding: 10,
            margin: 20,
            logo_width: 150,
            logo_height: 75,
            logo_anchor: LogoAnchor::Bottom,
            frame_fit: ResizeStrategy::Fill,
            scale: 1,
        }
    }
}

impl StripLayout {
    /// Canvas width in layout units.
    pub const fn canvas_width(&self) -> u32 {
        self.photo_width + 2 * self.margin
    }

    /// Canvas height in layout units, from the fixed aspect ratio.
    pub fn canvas_height(&self) -> u32 {
        (f64::from(self.canvas_width()) / STRIP_ASPECT).round() as u32
    }

    /// Output image size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.canvas_width() * self.scale,
            self.canvas_height() * self.scale,
        )
    }

    /// Box of the `index`-th frame (0-based, top to bottom), in layout units.
    pub const fn frame_rect(&self, index: usize) -> Rect {
        let step = self.photo_height + self.padding;
        Rect::new(
            self.margin,
            self.margin + index as u32 * step,
            self.photo_width,
            self.photo_height,
        )
    }

    /// All frame boxes in capture order.
    pub fn frame_rects(&self) -> [Rect; SHOTS_PER_STRIP] {
        std::array::from_fn(|i| self.frame_rect(i))
    }

    /// Box the logo is fitted into, in layout units.
    pub fn logo_rect(&self) -> Rect {
        let canvas_w = self.canvas_width();
        let canvas_h = self.canvas_height();
        match self.logo_anchor {
            LogoAnchor::Bottom => {
                let w = self.logo_width.min(canvas_w);
                let h = self.logo_height.min(canvas_h);
                Rect::new((canvas_w - w) / 2, canvas_h - h, w, h)
            }
            LogoAnchor::Footer => {
                let top = self.frame_rect(SHOTS_PER_STRIP - 1).bottom();
                let free = canvas_h.saturating_sub(top + self.margin / 2);
                let h = self.logo_height.min(free);
                let w = self.logo_width.min(canvas_w);
                let y = top + (free - h) / 2;
                Rect::new((canvas_w - w) / 2, y, w, h)
            }
        }
    }

    /// Check the layout is drawable.
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::InvalidLayout`] if any dimension is zero or the
    /// frames do not fit on the canvas.
    pub fn validate(&self) -> Result<()> {
        if self.photo_width == 0 || self.photo_height == 0 {
            return Err(BoothError::InvalidLayout(
                "photo width and height must be positive".to_string(),
            ));
        }
        if self.scale == 0 || self.scale > 8 {
            return Err(BoothError::InvalidLayout(format!(
                "scale {} out of range 1-8",
                self.scale
            )));
        }

        let Some((canvas_h, frames_need)) = self.checked_extent() else {
            return Err(BoothError::InvalidLayout(
                "dimensions too large for a strip".to_string(),
            ));
        };
        if frames_need > canvas_h {
            return Err(BoothError::InvalidLayout(format!(
                "frames need {frames_need} units but the canvas is only {canvas_h} tall"
            )));
        }
        Ok(())
    }

    /// Canvas height and the height the frames need, or `None` if any
    /// derived size (pixel size included) leaves `u32`.
    fn checked_extent(&self) -> Option<(u32, u32)> {
        let canvas_w = self.margin.checked_mul(2)?.checked_add(self.photo_width)?;
        let canvas_h = (f64::from(canvas_w) / STRIP_ASPECT).round();
        if canvas_h > f64::from(u32::MAX) {
            return None;
        }
        let canvas_h = canvas_h as u32;
        canvas_w.checked_mul(self.scale)?;
        canvas_h.checked_mul(self.scale)?;

        let step = self.photo_height.checked_add(self.padding)?;
        let frames_need = step
            .checked_mul(SHOTS_PER_STRIP as u32 - 1)?
            .checked_add(self.photo_height)?
            .checked_add(self.margin.checked_mul(2)?)?;
        Some((canvas_h, frames_need))
    }
}
