//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::device::Facing;
use crate::layout::LogoAnchor;

/// Photobooth - four-shot countdown capture and photo-strip printing.
///
/// Robot Mode: use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "booth", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "BOOTH_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Config file (.toml, .yaml or .yml)
    #[arg(long, short = 'c', global = true, env = "BOOTH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Sessions ===
    /// Run a full four-shot session and build a strip
    Shoot(ShootArgs),

    /// Build a strip from four existing photos
    Compose(ComposeArgs),

    /// Render a two-up print document for a strip
    Export(ExportArgs),

    /// Show the strip geometry
    Layout(LayoutArgs),

    // === Configuration ===
    /// Write a default configuration file
    Init(InitArgs),

    /// Show the effective configuration
    Config(ConfigArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

/// Arguments for a live session.
///
/// # Examples
///
/// ```bash
/// # Shoot from a folder of stills, then print
/// booth shoot --from ~/camera-roll --export
///
/// # Selfie mode, share when done
/// booth shoot --from ./frames --facing front --share
/// ```
#[derive(Parser, Debug)]
pub struct ShootArgs {
    /// Directory of images that stands in for the camera
    #[arg(long, value_name = "DIR")]
    pub from: PathBuf,

    /// Camera direction (overrides config)
    #[arg(long)]
    pub facing: Option<Facing>,

    /// Seconds each countdown step stays up (overrides config)
    #[arg(long, value_name = "SECS")]
    pub tick: Option<f64>,

    /// Export a print document when the strip is ready
    #[arg(long)]
    pub export: bool,

    /// Share the strip when it is ready
    #[arg(long)]
    pub share: bool,
}

#[derive(Parser, Debug)]
pub struct ComposeArgs {
    /// Exactly four photos, top to bottom
    #[arg(required = true, num_args = 4, value_name = "PHOTO")]
    pub photos: Vec<PathBuf>,

    /// Directory to write the strip into (overrides config)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Logo image (overrides config)
    #[arg(long)]
    pub logo: Option<PathBuf>,

    /// Logo placement (overrides config)
    #[arg(long)]
    pub anchor: Option<LogoAnchor>,

    /// Output pixels per layout unit (overrides config)
    #[arg(long)]
    pub scale: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Strip PNG to export
    pub strip: PathBuf,

    /// Directory to write the document into (overrides config)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Send the document to the configured print command
    #[arg(long)]
    pub print: bool,
}

#[derive(Parser, Debug)]
pub struct LayoutArgs {
    /// Output pixels per layout unit (overrides config)
    #[arg(long)]
    pub scale: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the file (defaults to the standard config location)
    pub path: Option<PathBuf>,

    /// Force overwrite existing configuration
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Only print the configuration file path
    #[arg(long)]
    pub path: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
