//! Photobooth CLI - four-shot countdown capture and photo-strip printing.
//!
//! Provides both human-friendly and script-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use booth::cli::{self, Cli, Commands};
use booth::compositor::StripCompositor;
use booth::config::{
    BoothConfig, default_config_path, load_config, save_config, validate_image_path,
};
use booth::device::{Facing, FolderCamera, SharedCamera, load_frame};
use booth::document::two_up_html;
use booth::error::{BoothError, Result, ResultExt};
use booth::image_ops::parse_color;
use booth::logging::init_logging;
use booth::output::{ConfigReport, LayoutReport, Output, OutputMode, StripReport, VersionInfo};
use booth::platform::{DocumentExporter, FileDocumentExporter, Platform};
use booth::render::{ImageRasterizer, LogoAsset, SharedRasterizer};
use booth::session::{BoothEvent, SessionBus, StripFrames};
use booth::{Booth, SessionOutcome};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> bool {
        option_env!("VERGEN_GIT_DIRTY") == Some("true")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    let out: Arc<dyn Output> = Arc::from(OutputMode::from_cli(&cli).into_output());

    if let Err(e) = run(&cli, &out).await {
        debug!(error = ?e, "Command failed");
        out.error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, out: &Arc<dyn Output>) -> Result<()> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Shoot(args)) => cmd_shoot(cli, out, args).await,
        Some(Commands::Compose(args)) => cmd_compose(cli, out, args).await,
        Some(Commands::Export(args)) => cmd_export(cli, out.as_ref(), args).await,
        Some(Commands::Layout(args)) => cmd_layout(cli, out.as_ref(), args),
        Some(Commands::Init(args)) => cmd_init(cli, out.as_ref(), args),
        Some(Commands::Config(args)) => cmd_config(cli, out.as_ref(), args),
        Some(Commands::Version) => {
            cmd_version(out.as_ref());
            Ok(())
        }
        Some(Commands::Completions(args)) => {
            cmd_completions(args);
            Ok(())
        }
    }
}

// === Quick Start ===

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn print_quick_start(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        print_robot_quick_start(cli);
    } else {
        print_human_quick_start();
    }
    Ok(())
}

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    session: RobotSession,
    setup: RobotSetup,
    output_modes: OutputModes,
}

#[derive(Serialize)]
struct RobotSession {
    shoot: &'static str,
    compose: &'static str,
    export: &'static str,
    layout: &'static str,
}

#[derive(Serialize)]
struct RobotSetup {
    init: &'static str,
    show_config: &'static str,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
    events: &'static str,
}

fn print_robot_quick_start(cli: &Cli) {
    let help = RobotQuickStart {
        tool: "booth",
        version: build_info::VERSION,
        description: "Four-shot photobooth: countdown capture, strip compositing, print and share",
        session: RobotSession {
            shoot: "booth shoot --from <DIR> [--export] [--share] --robot",
            compose: "booth compose <PHOTO> <PHOTO> <PHOTO> <PHOTO> --robot",
            export: "booth export <STRIP_PNG> [--print] --robot",
            layout: "booth layout --robot",
        },
        setup: RobotSetup {
            init: "booth init",
            show_config: "booth config --robot",
        },
        output_modes: OutputModes {
            human: "--format=text (default)",
            robot: "--robot or --format=json",
            compact: "--format=json-compact",
            events: "Session events stream as one JSON object per line",
        },
    };
    output_json(cli, &help);
}

fn print_human_quick_start() {
    println!(
        "{} {} - photobooth\n",
        style("booth").bold().cyan(),
        build_info::VERSION
    );

    println!("{}", style("QUICK START").bold().underlined());
    println!();
    println!("  {}  Run a session", style("booth shoot --from ./frames").green());
    println!("  {}  Print when done", style("booth shoot --from ./frames --export").green());
    println!("  {}  Strip from photos", style("booth compose a.png b.png c.png d.png").green());
    println!("  {}  Two-up print page", style("booth export strip.png").green());
    println!("  {}  Strip geometry", style("booth layout").green());
    println!();

    println!("{}", style("ROBOT MODE").bold().underlined());
    println!();
    println!("  {}  JSON output", style("booth --robot <command>").cyan());
    println!("  {}  Quick-start JSON", style("booth --robot").cyan());
    println!();

    println!("Run {} for full help", style("booth --help").yellow());
}

// === Sessions ===

async fn cmd_shoot(cli: &Cli, out: &Arc<dyn Output>, args: &cli::ShootArgs) -> Result<()> {
    let (mut config, _, _) = effective_config(cli)?;
    if let Some(facing) = args.facing {
        config.capture.facing = facing;
    }
    if let Some(secs) = args.tick {
        config.capture.tick_ms = tick_millis(secs)?;
    }
    config.validate()?;
    config.check_assets()?;

    let camera: SharedCamera =
        Arc::new(FolderCamera::open(&args.from)?.with_facing(config.capture.facing));
    let rasterizer: SharedRasterizer = Arc::new(ImageRasterizer::new(config.output.strip_dir()));
    let booth = Booth::builder(camera, rasterizer, Platform::desktop(&config.output))
        .configure(&config)?
        .build();

    let printer = spawn_event_printer(Arc::clone(out), booth.subscribe(), cli);
    info!(from = %args.from.display(), "Starting session");

    let result = run_session(&booth, args).await;
    let summary = booth.summary();
    drop(booth);
    // The printer ends once every event sender is gone
    let _ = printer.await;

    match result {
        Ok(report) => {
            out.strip(&report);
            Ok(())
        }
        Err(e) => {
            out.session(&summary);
            Err(e)
        }
    }
}

async fn run_session(booth: &Booth, args: &cli::ShootArgs) -> Result<StripReport> {
    let artifact = match booth.start_sequence().await? {
        SessionOutcome::Ready(artifact) => artifact,
        SessionOutcome::AlreadyRunning => {
            return Err(BoothError::Busy {
                operation: "start session",
            });
        }
    };

    let mut report = StripReport::new(&artifact);
    if args.export {
        report.document = Some(booth.export().await?);
    }
    if args.share {
        booth.share().await?;
        report.shared = true;
    }
    Ok(report)
}

async fn cmd_compose(cli: &Cli, out: &Arc<dyn Output>, args: &cli::ComposeArgs) -> Result<()> {
    let (mut config, _, _) = effective_config(cli)?;
    if let Some(dir) = &args.out_dir {
        config.output.dir = Some(dir.clone());
    }
    if let Some(logo) = &args.logo {
        config.strip.logo = Some(logo.clone());
    }
    if let Some(anchor) = args.anchor {
        config.strip.layout.logo_anchor = anchor;
    }
    if let Some(scale) = args.scale {
        config.strip.layout.scale = scale;
    }
    config.validate()?;
    config.check_assets()?;

    let frames = args
        .photos
        .iter()
        .map(|path| load_frame(path, Facing::Back))
        .collect::<Result<Vec<_>>>()?;
    let frames = StripFrames::try_from(frames)?;
    let logo = config
        .strip
        .logo
        .as_deref()
        .map(LogoAsset::load)
        .transpose()?;

    let bus = Arc::new(SessionBus::new());
    let rasterizer: SharedRasterizer = Arc::new(ImageRasterizer::new(config.output.strip_dir()));
    let compositor = StripCompositor::new(rasterizer, Platform::desktop(&config.output), Arc::clone(&bus))
        .with_layout(config.strip.layout)
        .with_background(parse_color(&config.strip.background)?)
        .with_settle(Duration::from_millis(config.strip.settle_ms));

    let printer = spawn_event_printer(Arc::clone(out), bus.subscribe(), cli);
    let result = compositor.build_strip(frames, logo.as_ref()).await;
    drop(compositor);
    drop(bus);
    let _ = printer.await;

    let artifact = result?;
    out.strip(&StripReport::new(&*artifact));
    Ok(())
}

async fn cmd_export(cli: &Cli, out: &dyn Output, args: &cli::ExportArgs) -> Result<()> {
    let (config, _, _) = effective_config(cli)?;
    validate_image_path(&args.strip)?;

    let bytes = tokio::fs::read(&args.strip)
        .await
        .with_context(|| format!("reading {}", args.strip.display()))?;
    image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .map_err(|e| BoothError::ImageFormat(format!("{}: {e}", args.strip.display())))?;

    let dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| config.output.strip_dir());
    let exporter =
        FileDocumentExporter::new(dir).with_print_command(config.output.print_command.clone());
    let document = exporter
        .render_to_document(&two_up_html(&STANDARD.encode(&bytes)))
        .await?;
    if args.print {
        exporter.present_print_dialog(&document).await?;
    }

    out.document(&document);
    Ok(())
}

fn cmd_layout(cli: &Cli, out: &dyn Output, args: &cli::LayoutArgs) -> Result<()> {
    let (config, _, _) = effective_config(cli)?;
    let mut layout = config.strip.layout;
    if let Some(scale) = args.scale {
        layout.scale = scale;
    }
    layout.validate()?;

    out.layout(&LayoutReport::from(&layout));
    Ok(())
}

// === Configuration ===

fn cmd_init(cli: &Cli, out: &dyn Output, args: &cli::InitArgs) -> Result<()> {
    let path = args
        .path
        .clone()
        .or_else(|| cli.config.clone())
        .unwrap_or_else(default_config_path);

    if path.exists() && !args.force {
        return Err(BoothError::Other(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    save_config(&BoothConfig::default(), &path)?;
    out.success(&format!("Wrote {}", path.display()));
    Ok(())
}

fn cmd_config(cli: &Cli, out: &dyn Output, args: &cli::ConfigArgs) -> Result<()> {
    let (config, path, exists) = effective_config(cli)?;

    if args.path {
        if cli.use_json() {
            output_json(
                cli,
                &serde_json::json!({ "path": path, "exists": exists }),
            );
        } else {
            println!("{}", path.display());
        }
        return Ok(());
    }

    out.config(&ConfigReport {
        path,
        exists,
        config,
    });
    Ok(())
}

// === Utilities ===

fn cmd_version(out: &dyn Output) {
    out.version_info(&VersionInfo {
        version: build_info::VERSION,
        git_sha: build_info::git_sha(),
        git_dirty: build_info::git_dirty(),
        build_timestamp: build_info::build_timestamp(),
        rustc_version: build_info::rustc_semver(),
        target: build_info::target(),
    });
}

fn cmd_completions(args: &cli::CompletionsArgs) {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "booth", &mut io::stdout());
}

// === Helpers ===

/// Load `--config`, else the default file if present, else built-in
/// defaults resolved against the working directory.
fn effective_config(cli: &Cli) -> Result<(BoothConfig, PathBuf, bool)> {
    if let Some(path) = &cli.config {
        return Ok((load_config(path)?, path.clone(), true));
    }

    let path = default_config_path();
    if path.is_file() {
        return Ok((load_config(&path)?, path, true));
    }

    debug!(path = %path.display(), "No config file, using defaults");
    let mut config = BoothConfig::default();
    config.resolve_paths(&std::env::current_dir()?)?;
    Ok((config, path, false))
}

fn tick_millis(secs: f64) -> Result<u64> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(BoothError::ConfigInvalid(format!(
            "--tick must be a non-negative number of seconds, got {secs}"
        )));
    }
    Ok((secs * 1000.0).round() as u64)
}

/// Forward session events to the output until the bus closes. Human mode
/// shows a spinner while the strip builds.
fn spawn_event_printer(
    out: Arc<dyn Output>,
    mut events: broadcast::Receiver<BoothEvent>,
    cli: &Cli,
) -> JoinHandle<()> {
    let robot = cli.use_json();
    let silent = cli.quiet && !robot;

    tokio::spawn(async move {
        let mut spinner: Option<ProgressBar> = None;
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event printer lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            match &event {
                BoothEvent::BuildStarted if !robot && !silent => {
                    spinner = Some(build_spinner());
                }
                BoothEvent::ArtifactReady { .. } | BoothEvent::BuildFailed { .. } => {
                    if let Some(bar) = spinner.take() {
                        bar.finish_and_clear();
                    }
                }
                _ => {}
            }
            if !silent {
                out.event(&event);
            }
        }
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
    })
}

fn build_spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message("Building your strip...");
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn output_json<T: Serialize>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!(r#"{{"error":true,"message":"serialization failed: {e}"}}"#),
    }
}
