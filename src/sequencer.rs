//! Four-shot capture sequencing.
//!
//! Each round shows a 3-2-1 countdown, one step per tick, then takes one
//! still. A failed capture aborts the whole run: the frames taken so far are
//! kept for inspection but never handed on as a strip.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use crate::device::{CaptureResult, CaptureSettings, CapturedFrame, Facing, SharedCamera};
use crate::error::{BoothError, CaptureFailure, Result};
use crate::layout::SHOTS_PER_STRIP;
use crate::session::{
    BoothEvent, BusyGuard, CaptureSession, SessionBus, SessionPhase, StripFrames, lock,
};

/// Countdown and capture timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTiming {
    /// First countdown value; counts down to 1.
    pub countdown_from: u8,
    /// Time each countdown value stays on screen.
    pub tick: Duration,
    /// Longest a single capture call may take before it counts as failed.
    pub capture_timeout: Duration,
}

impl Default for SequenceTiming {
    fn default() -> Self {
        Self {
            countdown_from: 3,
            tick: Duration::from_secs(1),
            capture_timeout: Duration::from_secs(10),
        }
    }
}

/// What a call to [`CaptureSequencer::start_sequence`] did.
#[derive(Debug, Clone)]
pub enum SequenceOutcome {
    /// All shots were taken.
    Completed(StripFrames),
    /// Another run was already in progress; nothing happened.
    AlreadyRunning,
}

/// Drives the camera through one strip's worth of countdown rounds.
pub struct CaptureSequencer {
    camera: SharedCamera,
    settings: CaptureSettings,
    timing: SequenceTiming,
    session: Mutex<CaptureSession>,
    facing: Mutex<Facing>,
    busy: AtomicBool,
    bus: Arc<SessionBus>,
}

impl CaptureSequencer {
    pub fn new(camera: SharedCamera, bus: Arc<SessionBus>) -> Self {
        Self {
            camera,
            settings: CaptureSettings::default(),
            timing: SequenceTiming::default(),
            session: Mutex::new(CaptureSession::new()),
            facing: Mutex::new(Facing::default()),
            busy: AtomicBool::new(false),
            bus,
        }
    }

    #[must_use]
    pub fn with_timing(mut self, timing: SequenceTiming) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: CaptureSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Start facing `facing` instead of the default back camera.
    #[must_use]
    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = Mutex::new(facing);
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn facing(&self) -> Facing {
        *lock(&self.facing)
    }

    pub fn countdown(&self) -> Option<u8> {
        self.session().countdown()
    }

    pub fn frame_count(&self) -> usize {
        self.session().frame_count()
    }

    /// Copies of the frames captured so far, in order.
    pub fn frames(&self) -> Vec<CapturedFrame> {
        self.session().frames().to_vec()
    }

    pub const fn timing(&self) -> &SequenceTiming {
        &self.timing
    }

    /// Run a full capture sequence.
    ///
    /// Calling this while a run is in progress is a no-op that returns
    /// [`SequenceOutcome::AlreadyRunning`].
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::Capture`] naming the failed shot if any capture
    /// produced no frame. The frames before it are kept.
    #[instrument(skip(self), fields(camera = %self.camera.info().id))]
    pub async fn start_sequence(&self) -> Result<SequenceOutcome> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!("Capture sequence already running, ignoring start");
            return Ok(SequenceOutcome::AlreadyRunning);
        };

        self.session().clear();
        info!(shots = SHOTS_PER_STRIP, "Starting capture sequence");
        self.bus.emit(BoothEvent::SequenceStarted);

        for shot in 1..=SHOTS_PER_STRIP {
            self.bus.transition(SessionPhase::Capturing { shot });

            if let Err(cause) = self.run_round(shot).await {
                let frames = self.frame_count();
                warn!(shot, frames, %cause, "Capture sequence aborted");
                let error = BoothError::Capture { shot, cause };
                self.bus.emit(BoothEvent::SequenceAborted {
                    shot,
                    reason: error.to_string(),
                });
                self.bus.transition(SessionPhase::Aborted {
                    frames,
                    reason: error.to_string(),
                });
                return Err(error);
            }
        }

        let frames = StripFrames::try_from(self.frames())?;

        info!("Capture sequence complete");
        self.bus.emit(BoothEvent::SequenceCompleted);
        Ok(SequenceOutcome::Completed(frames))
    }

    /// One countdown plus one capture.
    async fn run_round(&self, shot: usize) -> std::result::Result<(), CaptureFailure> {
        for value in (1..=self.timing.countdown_from).rev() {
            self.session().set_countdown(Some(value));
            debug!(shot, value, "Countdown");
            self.bus.emit(BoothEvent::Countdown { shot, value });
            sleep(self.timing.tick).await;
        }
        self.session().set_countdown(None);
        self.bus.emit(BoothEvent::CountdownCleared { shot });

        let result = timeout(
            self.timing.capture_timeout,
            self.camera.capture_still(&self.settings),
        )
        .await
        .unwrap_or(CaptureResult::Failure(CaptureFailure::TimedOut(
            self.timing.capture_timeout,
        )));

        match result {
            CaptureResult::Frame(frame) => {
                let count = self
                    .session()
                    .push_frame(frame)
                    .map_err(|e| CaptureFailure::Device(e.to_string()))?;
                debug!(shot, frames = count, "Frame captured");
                self.bus.emit(BoothEvent::FrameCaptured { shot });
                Ok(())
            }
            CaptureResult::Failure(failure) => Err(failure),
        }
    }

    /// Flip between front and back cameras.
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::Busy`] while a sequence runs, or the camera's
    /// error if it cannot switch.
    pub async fn toggle_facing(&self) -> Result<Facing> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            return Err(BoothError::Busy {
                operation: "switch camera",
            });
        };

        let next = self.facing().toggled();
        self.camera.set_facing(next).await?;
        *lock(&self.facing) = next;

        info!(facing = %next, "Camera facing changed");
        self.bus.emit(BoothEvent::FacingChanged { facing: next });
        Ok(next)
    }

    /// Discard all captured frames.
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::Busy`] while a sequence runs.
    pub fn reset(&self) -> Result<()> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            return Err(BoothError::Busy { operation: "retake" });
        };
        self.session().clear();
        Ok(())
    }

    fn session(&self) -> MutexGuard<'_, CaptureSession> {
        lock(&self.session)
    }
}
