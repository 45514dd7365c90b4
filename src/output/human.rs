//! Human-friendly terminal output styled with `console`.

use std::path::Path;

use console::{Style, Term, style};
use tracing::debug;

use crate::error::BoothError;
use crate::layout::SHOTS_PER_STRIP;
use crate::session::{BoothEvent, SessionSummary};

use super::{ConfigReport, LayoutReport, Output, StripReport, VersionInfo};

/// Styled terminal output.
pub struct HumanOutput {
    out: Term,
    err: Term,
    label: Style,
    muted: Style,
}

impl HumanOutput {
    pub fn new(color: bool) -> Self {
        debug!(color, "Creating HumanOutput");
        if !color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            label: Style::new().bold(),
            muted: Style::new().dim(),
        }
    }

    fn line(&self, text: &str) {
        // A closed stdout is not worth failing a session over
        let _ = self.out.write_line(text);
    }

    fn field(&self, name: &str, value: impl std::fmt::Display) {
        self.line(&format!("  {:<10} {value}", self.label.apply_to(name)));
    }
}

impl Output for HumanOutput {
    fn success(&self, message: &str) {
        self.line(&format!("{} {message}", style("[OK]").green().bold()));
    }

    fn error(&self, error: &BoothError) {
        let _ = self.err.write_line(&format!(
            "{} {}",
            style("[ERR]").red().bold(),
            style(error).bold()
        ));
        if let Some(suggestion) = error.suggestion() {
            let _ = self.err.write_line(&format!(
                "      {}",
                self.muted.apply_to(format!("Hint: {suggestion}"))
            ));
        }
    }

    fn warning(&self, message: &str) {
        let _ = self
            .err
            .write_line(&format!("{} {message}", style("[WARN]").yellow().bold()));
    }

    fn info(&self, message: &str) {
        self.line(&format!("{} {message}", style("[..]").cyan()));
    }

    fn event(&self, event: &BoothEvent) {
        match event {
            BoothEvent::SequenceStarted => self.line(&format!(
                "{}",
                style("Get ready! Four photos coming up.").bold()
            )),
            BoothEvent::Countdown { value, .. } => {
                self.line(&format!("    {}", style(value).yellow().bold()));
            }
            BoothEvent::FrameCaptured { shot } => {
                self.success(&format!("Photo {shot} of {SHOTS_PER_STRIP}"));
            }
            BoothEvent::SequenceAborted { reason, .. } => self.warning(reason),
            BoothEvent::FacingChanged { facing } => self.info(&format!("Camera facing {facing}")),
            BoothEvent::SavedToLibrary { path } => {
                self.info(&format!("Saved to library: {}", path.display()));
            }
            BoothEvent::Shared { path } => self.success(&format!("Shared {}", path.display())),
            // Build progress is shown by the spinner; the rest is not news
            _ => {}
        }
    }

    fn session(&self, summary: &SessionSummary) {
        self.line(&format!("{}", self.label.apply_to(&summary.message)));
        self.field("frames", format!("{}/{SHOTS_PER_STRIP}", summary.frames));
        self.field("facing", summary.facing);
    }

    fn strip(&self, report: &StripReport) {
        self.success("Strip ready");
        self.field("file", report.path.display());
        self.field("size", format!("{}x{}", report.width, report.height));
        self.field("sha256", self.muted.apply_to(&report.digest));
        if let Some(document) = &report.document {
            self.field("document", document.display());
        }
        if report.shared {
            self.field("shared", "yes");
        }
    }

    fn document(&self, path: &Path) {
        self.success(&format!("Print document written to {}", path.display()));
    }

    fn layout(&self, report: &LayoutReport) {
        self.line(&format!(
            "{} {}x{} units, {}x{} px at scale {}",
            self.label.apply_to("Strip"),
            report.canvas_width,
            report.canvas_height,
            report.pixel_width,
            report.pixel_height,
            report.scale
        ));
        for (i, rect) in report.frames.iter().enumerate() {
            self.field(
                &format!("photo {}", i + 1),
                format!("{}x{} at ({}, {})", rect.width, rect.height, rect.x, rect.y),
            );
        }
        let logo = report.logo;
        self.field(
            "logo",
            format!(
                "{}x{} at ({}, {}) [{:?}]",
                logo.width, logo.height, logo.x, logo.y, report.logo_anchor
            ),
        );
    }

    fn config(&self, report: &ConfigReport) {
        let source = if report.exists {
            report.path.display().to_string()
        } else {
            format!("{} (not found, using defaults)", report.path.display())
        };
        self.line(&format!("{} {source}", self.label.apply_to("Config:")));

        match toml::to_string_pretty(&report.config) {
            Ok(text) => self.line(text.trim_end()),
            Err(e) => self.warning(&format!("cannot display config: {e}")),
        }
    }

    fn version_info(&self, info: &VersionInfo) {
        self.line(&format!("{} {}", style("booth").cyan().bold(), info.version));
        let dirty = if info.git_dirty { " (dirty)" } else { "" };
        self.field("git", format!("{}{dirty}", info.git_sha));
        self.field("built", info.build_timestamp);
        self.field("rustc", info.rustc_version);
        self.field("target", info.target);
    }
}
