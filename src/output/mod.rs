//! Output mode abstraction for robot and human output.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::Cli;
use crate::compositor::CompositeArtifact;
use crate::config::BoothConfig;
use crate::error::BoothError;
use crate::layout::{LogoAnchor, Rect, SHOTS_PER_STRIP, StripLayout};
use crate::session::{BoothEvent, SessionSummary};

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// A finished strip, plus what happened to it.
#[derive(Debug, Clone, Serialize)]
pub struct StripReport {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,
    pub shared: bool,
}

impl StripReport {
    #[must_use]
    pub fn new(artifact: &CompositeArtifact) -> Self {
        Self {
            path: artifact.path.clone(),
            width: artifact.width,
            height: artifact.height,
            digest: artifact.digest.clone(),
            document: None,
            shared: false,
        }
    }
}

/// Computed strip geometry.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub scale: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub frames: [Rect; SHOTS_PER_STRIP],
    pub logo: Rect,
    pub logo_anchor: LogoAnchor,
}

impl From<&StripLayout> for LayoutReport {
    fn from(layout: &StripLayout) -> Self {
        let (pixel_width, pixel_height) = layout.pixel_size();
        Self {
            canvas_width: layout.canvas_width(),
            canvas_height: layout.canvas_height(),
            scale: layout.scale,
            pixel_width,
            pixel_height,
            frames: layout.frame_rects(),
            logo: layout.logo_rect(),
            logo_anchor: layout.logo_anchor,
        }
    }
}

/// The effective configuration and where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub path: PathBuf,
    pub exists: bool,
    pub config: BoothConfig,
}

/// Build metadata for `booth version`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_sha: &'static str,
    pub git_dirty: bool,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
    pub target: &'static str,
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for scripts.
    Robot(RobotFormat),
    /// Styled terminal output for people.
    Human { color: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub const fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human {
                color: !cli.no_color,
            }
        }
    }

    /// Returns true if output should be JSON.
    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { color } => Box::new(HumanOutput::new(color)),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output: Send + Sync {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &BoothError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Session progress
    fn event(&self, event: &BoothEvent);
    fn session(&self, summary: &SessionSummary);

    // Results
    fn strip(&self, report: &StripReport);
    fn document(&self, path: &Path);
    fn layout(&self, report: &LayoutReport);
    fn config(&self, report: &ConfigReport);

    // Metadata
    fn version_info(&self, info: &VersionInfo);
}
