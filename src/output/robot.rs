//! Robot mode JSON output.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::BoothError;
use crate::session::{BoothEvent, SessionSummary};

use super::{ConfigReport, LayoutReport, Output, RobotFormat, StripReport, VersionInfo};

/// JSON output for scripts and kiosk supervisors.
///
/// Results go to stdout, errors to stderr. Session events are streamed one
/// object per line regardless of format.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> String {
        let json = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        json.unwrap_or_else(|e| format!(r#"{{"error":true,"message":"serialization failed: {e}"}}"#))
    }

    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        let json = self.render(data);
        trace!(json_len = json.len(), "JSON serialized");
        println!("{json}");
    }
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        self.output_json(&serde_json::json!({ "success": true, "message": message }));
    }

    fn error(&self, error: &BoothError) {
        debug!(error = %error, "Robot: error");
        eprintln!(
            "{}",
            self.render(&serde_json::json!({
                "error": true,
                "kind": error.kind(),
                "message": error.to_string(),
                "suggestion": error.suggestion(),
                "recoverable": error.is_user_recoverable(),
            }))
        );
    }

    fn warning(&self, message: &str) {
        self.output_json(&serde_json::json!({ "warning": true, "message": message }));
    }

    fn info(&self, message: &str) {
        self.output_json(&serde_json::json!({ "info": true, "message": message }));
    }

    fn event(&self, event: &BoothEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => debug!(error = %e, "Could not serialize event"),
        }
    }

    fn session(&self, summary: &SessionSummary) {
        self.output_json(summary);
    }

    fn strip(&self, report: &StripReport) {
        self.output_json(report);
    }

    fn document(&self, path: &Path) {
        self.output_json(&serde_json::json!({ "document": path, "ok": true }));
    }

    fn layout(&self, report: &LayoutReport) {
        self.output_json(report);
    }

    fn config(&self, report: &ConfigReport) {
        self.output_json(report);
    }

    fn version_info(&self, info: &VersionInfo) {
        self.output_json(info);
    }
}
