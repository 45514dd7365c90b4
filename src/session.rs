//! Session state for one run of the booth.
//!
//! Tracks the frames of the current capture run, the countdown overlay
//! value, and the phase of the session state machine. Phase changes and
//! fine-grained events are published so any rendering layer can follow
//! along without sharing mutable fields.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace};

use crate::device::{CapturedFrame, Facing};
use crate::error::{BoothError, Result};
use crate::layout::SHOTS_PER_STRIP;

/// Frames of one capture run, plus the countdown overlay.
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    frames: Vec<CapturedFrame>,
    countdown: Option<u8>,
}

impl CaptureSession {
    /// Create a new empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a captured frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the session already holds a full strip.
    pub fn push_frame(&mut self, frame: CapturedFrame) -> Result<usize> {
        if self.is_complete() {
            return Err(BoothError::Other(format!(
                "session already holds {SHOTS_PER_STRIP} frames"
            )));
        }
        self.frames.push(frame);
        trace!(frames = self.frames.len(), "Recorded frame");
        Ok(self.frames.len())
    }

    /// Show a countdown value, or hide the overlay with `None`.
    pub fn set_countdown(&mut self, value: Option<u8>) {
        self.countdown = value;
    }

    /// Drop every frame and hide the countdown.
    pub fn clear(&mut self) {
        debug!(frames = self.frames.len(), "Clearing capture session");
        self.frames.clear();
        self.countdown = None;
    }

    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub const fn countdown(&self) -> Option<u8> {
        self.countdown
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// A session is complete only at exactly one full strip of frames.
    pub fn is_complete(&self) -> bool {
        self.frames.len() == SHOTS_PER_STRIP
    }

    /// Hand out the completed frame set, if there is one.
    pub fn completed(&self) -> Option<StripFrames> {
        StripFrames::try_from(self.frames.clone()).ok()
    }
}

/// Exactly one strip's worth of frames, in capture order.
///
/// Only constructible from a full set, so a partial run can never reach
/// the compositor.
#[derive(Debug, Clone)]
pub struct StripFrames([CapturedFrame; SHOTS_PER_STRIP]);

impl StripFrames {
    pub fn iter(&self) -> impl Iterator<Item = &CapturedFrame> {
        self.0.iter()
    }

    pub const fn as_array(&self) -> &[CapturedFrame; SHOTS_PER_STRIP] {
        &self.0
    }
}

impl TryFrom<Vec<CapturedFrame>> for StripFrames {
    type Error = BoothError;

    fn try_from(frames: Vec<CapturedFrame>) -> Result<Self> {
        let actual = frames.len();
        let array: [CapturedFrame; SHOTS_PER_STRIP] =
            frames
                .try_into()
                .map_err(|_| BoothError::IncompleteSequence {
                    expected: SHOTS_PER_STRIP,
                    actual,
                })?;
        Ok(Self(array))
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing captured; the camera view is live.
    Empty,
    /// A capture run is in progress on the given shot (1-based).
    Capturing { shot: usize },
    /// A capture failed; the frames taken so far are kept.
    Aborted { frames: usize, reason: String },
    /// Four frames are in and the strip is being rendered.
    Building,
    /// The strip is available.
    Ready {
        exporting: bool,
        sharing: bool,
    },
    /// Rendering failed; only a retake recovers.
    BuildFailed { message: String },
}

impl SessionPhase {
    /// Short message for a status line.
    pub fn status_message(&self) -> String {
        match self {
            Self::Empty => "No photos to display.".to_string(),
            Self::Capturing { shot } => format!("Taking photo {shot} of {SHOTS_PER_STRIP}"),
            Self::Aborted { reason, .. } => reason.clone(),
            Self::Building => "Building strip...".to_string(),
            Self::Ready { exporting: true, .. } => "Exporting...".to_string(),
            Self::Ready { sharing: true, .. } => "Sharing...".to_string(),
            Self::Ready { .. } => "Strip ready".to_string(),
            Self::BuildFailed { message } => message.clone(),
        }
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Fine-grained notifications emitted while a session runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoothEvent {
    SequenceStarted,
    Countdown { shot: usize, value: u8 },
    CountdownCleared { shot: usize },
    FrameCaptured { shot: usize },
    SequenceCompleted,
    SequenceAborted { shot: usize, reason: String },
    FacingChanged { facing: Facing },
    BuildStarted,
    ArtifactReady { path: PathBuf, width: u32, height: u32 },
    BuildFailed { message: String },
    SavedToLibrary { path: PathBuf },
    Exported { document: PathBuf },
    Shared { path: PathBuf },
    Reset,
}

/// Channels that carry session phase and events to observers.
#[derive(Debug)]
pub struct SessionBus {
    phase: watch::Sender<SessionPhase>,
    events: broadcast::Sender<BoothEvent>,
}

/// Capacity of the event channel; slow observers lag rather than block.
const EVENT_CAPACITY: usize = 64;

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBus {
    #[must_use]
    pub fn new() -> Self {
        let (phase, _) = watch::channel(SessionPhase::Empty);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { phase, events }
    }

    /// Move the session to `phase`.
    pub fn transition(&self, phase: SessionPhase) {
        let previous = self.phase.send_replace(phase.clone());
        if previous != phase {
            info!(from = ?previous, to = ?phase, "Session phase changed");
        }
    }

    /// Update the current phase in place.
    pub fn update(&self, f: impl FnOnce(&mut SessionPhase)) {
        self.phase.send_modify(f);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.borrow().clone()
    }

    /// Publish an event. Having no observers is fine.
    pub fn emit(&self, event: BoothEvent) {
        trace!(?event, "Emitting event");
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoothEvent> {
        self.events.subscribe()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }
}

/// Holds an in-flight flag for as long as it lives.
///
/// Acquisition fails if the flag is already set, which is how overlapping
/// calls to the same operation get rejected.
#[derive(Debug)]
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Lock a mutex, recovering the data if a panicking holder poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Snapshot of a session for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub phase: SessionPhase,
    pub frames: usize,
    pub countdown: Option<u8>,
    pub facing: Facing,
    pub busy: bool,
    pub message: String,
}
