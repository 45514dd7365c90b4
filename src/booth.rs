//! The booth controller.
//!
//! Owns the capture sequencer and the strip compositor, and is the single
//! place that decides which user actions are allowed in which phase.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::compositor::{BuildState, CompositeArtifact, StripCompositor};
use crate::config::BoothConfig;
use crate::device::{CaptureSettings, CapturedFrame, Facing, SharedCamera};
use crate::error::{BoothError, Result};
use crate::image_ops::parse_color;
use crate::layout::StripLayout;
use crate::platform::Platform;
use crate::render::{LogoAsset, SharedRasterizer};
use crate::sequencer::{CaptureSequencer, SequenceOutcome, SequenceTiming};
use crate::session::{BoothEvent, BusyGuard, SessionBus, SessionPhase, SessionSummary};

/// Result of [`Booth::start_sequence`].
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// Four frames were captured and composed.
    Ready(Arc<CompositeArtifact>),
    /// A session was already running; nothing happened.
    AlreadyRunning,
}

/// Photobooth controller.
pub struct Booth {
    sequencer: CaptureSequencer,
    compositor: StripCompositor,
    logo: Option<LogoAsset>,
    running: AtomicBool,
    bus: Arc<SessionBus>,
}

impl Booth {
    pub fn builder(
        camera: SharedCamera,
        rasterizer: SharedRasterizer,
        platform: Platform,
    ) -> BoothBuilder {
        BoothBuilder::new(camera, rasterizer, platform)
    }

    /// Run a whole session: four countdown rounds, then build the strip.
    ///
    /// A call while a session, retake, or camera switch is in flight does
    /// nothing and returns [`SessionOutcome::AlreadyRunning`].
    ///
    /// # Errors
    ///
    /// [`BoothError::Capture`] if a shot fails (the phase becomes
    /// `Aborted`), [`BoothError::Build`] if composition fails (the phase
    /// becomes `BuildFailed`), and [`BoothError::Busy`] if the previous
    /// strip is still being exported or shared.
    #[instrument(skip(self))]
    pub async fn start_sequence(&self) -> Result<SessionOutcome> {
        let Some(_running) = BusyGuard::acquire(&self.running) else {
            info!("Session already running, ignoring start");
            return Ok(SessionOutcome::AlreadyRunning);
        };

        self.compositor.reset().await?;
        let frames = match self.sequencer.start_sequence().await? {
            SequenceOutcome::Completed(frames) => frames,
            SequenceOutcome::AlreadyRunning => return Ok(SessionOutcome::AlreadyRunning),
        };

        let artifact = self
            .compositor
            .build_strip(frames, self.logo.as_ref())
            .await?;
        Ok(SessionOutcome::Ready(artifact))
    }

    /// Switch between the front and back camera.
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::Busy`] while a session, retake, or another
    /// switch is in flight, or the camera's error if it cannot switch.
    pub async fn toggle_facing(&self) -> Result<Facing> {
        let Some(_running) = BusyGuard::acquire(&self.running) else {
            return Err(BoothError::Busy {
                operation: "switch camera",
            });
        };
        self.sequencer.toggle_facing().await
    }

    /// Throw away the frames and strip and go back to capture mode.
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::Busy`] while a session, export, or share is in
    /// flight.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<()> {
        let Some(_running) = BusyGuard::acquire(&self.running) else {
            return Err(BoothError::Busy { operation: "retake" });
        };
        // The sequencer is only driven under `running`, so it cannot be busy here
        self.compositor.reset().await?;
        self.sequencer.reset()?;

        self.bus.transition(SessionPhase::Empty);
        self.bus.emit(BoothEvent::Reset);
        Ok(())
    }

    /// Print the current strip two-up, returning the document location.
    ///
    /// # Errors
    ///
    /// See [`StripCompositor::export_as_document`].
    pub async fn export(&self) -> Result<std::path::PathBuf> {
        self.compositor.export_as_document().await
    }

    /// Share the current strip.
    ///
    /// # Errors
    ///
    /// See [`StripCompositor::share_artifact`].
    pub async fn share(&self) -> Result<()> {
        self.compositor.share_artifact().await
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> SessionPhase {
        self.bus.phase()
    }

    pub fn artifact(&self) -> Option<Arc<CompositeArtifact>> {
        self.compositor.artifact()
    }

    pub fn build_state(&self) -> BuildState {
        self.compositor.state()
    }

    pub fn frames(&self) -> Vec<CapturedFrame> {
        self.sequencer.frames()
    }

    pub fn facing(&self) -> Facing {
        self.sequencer.facing()
    }

    pub fn layout(&self) -> &StripLayout {
        self.compositor.layout()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoothEvent> {
        self.bus.subscribe()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.bus.watch_phase()
    }

    /// Point-in-time view of the session.
    pub fn summary(&self) -> SessionSummary {
        let phase = self.bus.phase();
        SessionSummary {
            message: phase.status_message(),
            phase,
            frames: self.sequencer.frame_count(),
            countdown: self.sequencer.countdown(),
            facing: self.sequencer.facing(),
            busy: self.is_running()
                || self.compositor.is_exporting()
                || self.compositor.is_sharing(),
        }
    }
}

/// Assembles a [`Booth`] from its collaborators and settings.
pub struct BoothBuilder {
    camera: SharedCamera,
    rasterizer: SharedRasterizer,
    platform: Platform,
    timing: SequenceTiming,
    settings: CaptureSettings,
    facing: Facing,
    layout: StripLayout,
    background: [u8; 3],
    settle: Option<Duration>,
    logo: Option<LogoAsset>,
}

impl BoothBuilder {
    pub fn new(camera: SharedCamera, rasterizer: SharedRasterizer, platform: Platform) -> Self {
        Self {
            camera,
            rasterizer,
            platform,
            timing: SequenceTiming::default(),
            settings: CaptureSettings::default(),
            facing: Facing::default(),
            layout: StripLayout::default(),
            background: [255, 255, 255],
            settle: None,
            logo: None,
        }
    }

    /// Apply the capture and strip sections of a loaded config.
    ///
    /// # Errors
    ///
    /// Returns an error if the background color is malformed or the logo
    /// cannot be loaded.
    pub fn configure(mut self, config: &BoothConfig) -> Result<Self> {
        self.timing = config.capture.timing();
        self.settings = config.capture.settings();
        self.facing = config.capture.facing;
        self.layout = config.strip.layout;
        self.background = parse_color(&config.strip.background)?;
        self.settle = Some(Duration::from_millis(config.strip.settle_ms));
        self.logo = config
            .strip
            .logo
            .as_deref()
            .map(LogoAsset::load)
            .transpose()?;
        Ok(self)
    }

    #[must_use]
    pub fn timing(mut self, timing: SequenceTiming) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: StripLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = Some(settle);
        self
    }

    #[must_use]
    pub fn logo(mut self, logo: Option<LogoAsset>) -> Self {
        self.logo = logo;
        self
    }

    pub fn build(self) -> Booth {
        let bus = Arc::new(SessionBus::new());
        let sequencer = CaptureSequencer::new(self.camera, Arc::clone(&bus))
            .with_timing(self.timing)
            .with_settings(self.settings)
            .with_facing(self.facing);

        let mut compositor = StripCompositor::new(self.rasterizer, self.platform, Arc::clone(&bus))
            .with_layout(self.layout)
            .with_background(self.background);
        if let Some(settle) = self.settle {
            compositor = compositor.with_settle(settle);
        }

        Booth {
            sequencer,
            compositor,
            logo: self.logo,
            running: AtomicBool::new(false),
            bus,
        }
    }
}
