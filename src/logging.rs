//! Tracing setup for the booth CLI.
//!
//! Logs always go to stderr so stdout stays clean for results and the
//! robot-mode event stream.

use std::io::{self, IsTerminal};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    /// JSON lines, for kiosk supervisors and scripts.
    Json,
    /// Colored, for an interactive terminal.
    Pretty,
    /// Compact and uncolored, for pipes and log files.
    Plain,
}

impl LogStyle {
    /// Pick a style from robot mode and whether stderr is a terminal.
    pub fn detect(robot_mode: bool) -> Self {
        if robot_mode {
            Self::Json
        } else if io::stderr().is_terminal() {
            Self::Pretty
        } else {
            Self::Plain
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the level picked from `verbose` and `quiet`
/// (e.g. `RUST_LOG=booth=debug,image=warn`). Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
pub fn init_logging(robot_mode: bool, verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match LogStyle::detect(robot_mode) {
        LogStyle::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogStyle::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .try_init(),
        LogStyle::Plain => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(io::stderr),
            )
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Filter directive used when `RUST_LOG` is unset.
///
/// Warnings only by default, since the CLI prints its own progress.
pub(crate) const fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "booth=error";
    }
    match verbose {
        0 => "booth=warn",
        1 => "booth=info",
        2 => "booth=debug",
        _ => "booth=trace",
    }
}
