//! Configuration schema.
//!
//! # Example TOML
//!
//! ```toml
//! [capture]
//! countdown_from = 3
//! tick_ms = 1000
//! facing = "front"
//!
//! [strip]
//! background = "#ffffff"
//! logo = "assets/logo.png"
//!
//! [strip.layout]
//! logo_anchor = "footer"
//!
//! [output]
//! dir = "~/Pictures/Photobooth/strips"
//! share_dir = "/media/usb"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::path::{resolve_path, validate_image_path};
use crate::device::{CaptureSettings, Facing};
use crate::error::{BoothError, Result};
use crate::image_ops::parse_color;
use crate::layout::StripLayout;
use crate::sequencer::SequenceTiming;

/// Complete booth configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    pub capture: CaptureConfig,
    pub strip: StripConfig,
    pub output: OutputConfig,
}

/// Countdown, timeout, and camera settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub countdown_from: u8,
    pub tick_ms: u64,
    pub timeout_ms: u64,
    pub facing: Facing,
    pub quality: f32,
    pub exif: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            tick_ms: 1000,
            timeout_ms: 10_000,
            facing: Facing::default(),
            quality: 1.0,
            exif: false,
        }
    }
}

impl CaptureConfig {
    pub const fn timing(&self) -> SequenceTiming {
        SequenceTiming {
            countdown_from: self.countdown_from,
            tick: Duration::from_millis(self.tick_ms),
            capture_timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    pub fn settings(&self) -> CaptureSettings {
        CaptureSettings {
            quality: self.quality,
            exif: self.exif,
            ..CaptureSettings::default()
        }
    }
}

/// Strip appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// `#rrggbb`
    pub background: String,
    /// Logo image; the strip has no logo when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<PathBuf>,
    /// Longest wait for the layout acknowledgement before rasterizing.
    pub settle_ms: u64,
    pub layout: StripLayout,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_string(),
            logo: None,
            settle_ms: 500,
            layout: StripLayout::default(),
        }
    }
}

/// Where strips, library copies, documents and shares go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for strip files and export documents. Defaults to a
    /// directory under the system temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Copy each finished strip into `library`.
    pub save_to_library: bool,
    pub library: PathBuf,
    /// Sharing is unavailable unless a share directory is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_dir: Option<PathBuf>,
    /// Command run with the export document as its last argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_command: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            save_to_library: true,
            library: PathBuf::from("~/Pictures/Photobooth"),
            share_dir: None,
            print_command: None,
        }
    }
}

impl OutputConfig {
    /// Strip output directory, falling back to the temp dir.
    pub fn strip_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("photobooth"))
    }

    /// Library directory, or `None` when saving is switched off.
    pub fn library_dir(&self) -> Option<&Path> {
        self.save_to_library.then_some(self.library.as_path())
    }
}

impl BoothConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::ConfigInvalid`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        trace!("Validating booth config");
        let capture = &self.capture;
        if capture.countdown_from == 0 {
            return Err(invalid("capture.countdown_from must be at least 1"));
        }
        if capture.timeout_ms == 0 {
            return Err(invalid("capture.timeout_ms must be positive"));
        }
        if !(0.0..=1.0).contains(&capture.quality) {
            return Err(invalid(format!(
                "capture.quality {} outside 0.0-1.0",
                capture.quality
            )));
        }

        parse_color(&self.strip.background)
            .map_err(|_| invalid(format!("strip.background '{}'", self.strip.background)))?;
        self.strip
            .layout
            .validate()
            .map_err(|e| invalid(format!("strip.layout: {e}")))?;

        debug!("Booth config validated");
        Ok(())
    }

    /// Resolve every path field against `base` (normally the config file's
    /// directory), expanding `~`.
    ///
    /// # Errors
    ///
    /// Returns an error if `~` is used and there is no home directory.
    pub fn resolve_paths(&mut self, base: &Path) -> Result<()> {
        if let Some(logo) = &self.strip.logo {
            self.strip.logo = Some(resolve_path(logo, base)?);
        }
        if let Some(dir) = &self.output.dir {
            self.output.dir = Some(resolve_path(dir, base)?);
        }
        self.output.library = resolve_path(&self.output.library, base)?;
        if let Some(share) = &self.output.share_dir {
            self.output.share_dir = Some(resolve_path(share, base)?);
        }
        Ok(())
    }

    /// Check that the configured logo, if any, is a readable image file.
    ///
    /// # Errors
    ///
    /// Returns an error if the logo path does not point at an image.
    pub fn check_assets(&self) -> Result<()> {
        match &self.strip.logo {
            Some(logo) => validate_image_path(logo),
            None => Ok(()),
        }
    }
}

fn invalid(message: impl Into<String>) -> BoothError {
    BoothError::ConfigInvalid(message.into())
}
