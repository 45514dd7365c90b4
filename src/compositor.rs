//! Strip composition and the actions available on a finished strip.
//!
//! The compositor owns at most one [`CompositeArtifact`] at a time. Building
//! a new strip discards the old one first, reset discards it outright, and
//! export and share only ever read it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::document::{PNG_MIME, PNG_UTI, two_up_html};
use crate::error::{BoothError, Result};
use crate::layout::StripLayout;
use crate::platform::{Permission, Platform};
use crate::render::{LogoAsset, RasterOutput, SharedRasterizer, StripScene};
use crate::session::{BoothEvent, BusyGuard, SessionBus, SessionPhase, StripFrames, lock};

/// Default wait for the rasterizer's layout acknowledgement.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// A finished strip.
///
/// The file at `path` and the base64 text in `encoded` are the same PNG.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeArtifact {
    pub id: Uuid,
    pub path: PathBuf,
    #[serde(skip)]
    pub encoded: String,
    pub width: u32,
    pub height: u32,
    pub digest: String,
    pub created_at: DateTime<Utc>,
}

impl CompositeArtifact {
    fn from_raster(output: RasterOutput) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: output.path,
            encoded: output.encoded,
            width: output.width,
            height: output.height,
            digest: output.digest,
            created_at: Utc::now(),
        }
    }

    /// The PNG bytes behind `encoded`.
    ///
    /// # Errors
    ///
    /// Returns an error if `encoded` is not valid base64.
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.encoded)
            .map_err(|e| BoothError::ImageProcessing(format!("artifact encoding: {e}")))
    }
}

/// What the compositor currently holds.
#[derive(Debug, Clone, Default)]
pub enum BuildState {
    #[default]
    Idle,
    Building,
    Ready(Arc<CompositeArtifact>),
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
enum Activity {
    Export,
    Share,
}

/// Marks an export or share as in flight, in the guard flag and on the
/// `Ready` phase, until dropped.
struct ActivityGuard<'a> {
    _busy: BusyGuard<'a>,
    bus: &'a SessionBus,
    activity: Activity,
}

impl<'a> ActivityGuard<'a> {
    fn acquire(flag: &'a AtomicBool, bus: &'a SessionBus, activity: Activity) -> Option<Self> {
        let busy = BusyGuard::acquire(flag)?;
        set_activity(bus, activity, true);
        Some(Self {
            _busy: busy,
            bus,
            activity,
        })
    }
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        set_activity(self.bus, self.activity, false);
    }
}

fn set_activity(bus: &SessionBus, activity: Activity, on: bool) {
    bus.update(|phase| {
        if let SessionPhase::Ready { exporting, sharing } = phase {
            match activity {
                Activity::Export => *exporting = on,
                Activity::Share => *sharing = on,
            }
        }
    });
}

/// Builds strips and runs export and share on them.
pub struct StripCompositor {
    rasterizer: SharedRasterizer,
    platform: Platform,
    layout: StripLayout,
    background: [u8; 3],
    settle: Duration,
    state: Mutex<BuildState>,
    build_lock: tokio::sync::Mutex<()>,
    exporting: AtomicBool,
    sharing: AtomicBool,
    bus: Arc<SessionBus>,
}

impl StripCompositor {
    pub fn new(rasterizer: SharedRasterizer, platform: Platform, bus: Arc<SessionBus>) -> Self {
        Self {
            rasterizer,
            platform,
            layout: StripLayout::default(),
            background: [255, 255, 255],
            settle: DEFAULT_SETTLE,
            state: Mutex::new(BuildState::Idle),
            build_lock: tokio::sync::Mutex::new(()),
            exporting: AtomicBool::new(false),
            sharing: AtomicBool::new(false),
            bus,
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: StripLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    /// Longest to wait for the layout acknowledgement before rasterizing.
    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub const fn layout(&self) -> &StripLayout {
        &self.layout
    }

    pub fn state(&self) -> BuildState {
        lock(&self.state).clone()
    }

    /// The current artifact, if a build has succeeded since the last reset.
    pub fn artifact(&self) -> Option<Arc<CompositeArtifact>> {
        match &*lock(&self.state) {
            BuildState::Ready(artifact) => Some(Arc::clone(artifact)),
            _ => None,
        }
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    pub fn is_sharing(&self) -> bool {
        self.sharing.load(Ordering::Acquire)
    }

    /// Compose `frames` (and `logo`, if any) into a new strip.
    ///
    /// Any previous artifact is discarded before rendering starts. On success
    /// the strip is offered to the photo library; that step never fails the
    /// build.
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::Build`] if the layout is invalid or rendering
    /// fails. No artifact is kept in that case.
    #[instrument(skip_all)]
    pub async fn build_strip(
        &self,
        frames: StripFrames,
        logo: Option<&LogoAsset>,
    ) -> Result<Arc<CompositeArtifact>> {
        let _build = self.build_lock.lock().await;

        self.discard().await;
        *lock(&self.state) = BuildState::Building;
        self.bus.transition(SessionPhase::Building);
        self.bus.emit(BoothEvent::BuildStarted);

        let scene = StripScene {
            layout: self.layout,
            frames,
            logo: logo.cloned(),
            background: self.background,
        };

        match self.render(&scene).await {
            Ok(artifact) => {
                let artifact = Arc::new(artifact);
                *lock(&self.state) = BuildState::Ready(Arc::clone(&artifact));
                self.bus.transition(SessionPhase::Ready {
                    exporting: false,
                    sharing: false,
                });
                self.bus.emit(BoothEvent::ArtifactReady {
                    path: artifact.path.clone(),
                    width: artifact.width,
                    height: artifact.height,
                });
                info!(path = %artifact.path.display(), digest = %artifact.digest, "Strip ready");

                self.save_to_library(&artifact.path).await;
                Ok(artifact)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "Strip build failed");
                *lock(&self.state) = BuildState::Failed(message.clone());
                self.bus.transition(SessionPhase::BuildFailed {
                    message: message.clone(),
                });
                self.bus.emit(BoothEvent::BuildFailed { message });
                Err(e)
            }
        }
    }

    async fn render(&self, scene: &StripScene) -> Result<CompositeArtifact> {
        scene
            .layout
            .validate()
            .map_err(|e| BoothError::Build(e.to_string()))?;

        match timeout(self.settle, self.rasterizer.layout_ready(scene)).await {
            Ok(true) => debug!("Layout acknowledged"),
            Ok(false) => warn!("Rasterizer reported layout not ready, rasterizing anyway"),
            Err(_) => warn!(
                settle_ms = self.settle.as_millis() as u64,
                "No layout acknowledgement, rasterizing after fallback delay"
            ),
        }

        let output = self.rasterizer.rasterize(scene).await.map_err(|e| match e {
            BoothError::Build(_) => e,
            other => BoothError::Build(other.to_string()),
        })?;
        Ok(CompositeArtifact::from_raster(output))
    }

    async fn save_to_library(&self, path: &Path) {
        let library = &self.platform.library;
        if library.request_permission().await == Permission::Denied {
            warn!(error = %BoothError::PermissionDenied, "Skipping library save");
            return;
        }
        match library.save(path).await {
            Ok(saved) => {
                debug!(saved = %saved.display(), "Saved to library");
                self.bus.emit(BoothEvent::SavedToLibrary { path: saved });
            }
            Err(e) => warn!(error = %e, "Library save failed"),
        }
    }

    /// Render the two-up print document and present the print flow.
    ///
    /// # Errors
    ///
    /// [`BoothError::NothingToExport`] without an artifact,
    /// [`BoothError::Busy`] while another export runs, and
    /// [`BoothError::Export`] if the exporter fails. The artifact is never
    /// touched.
    #[instrument(skip(self))]
    pub async fn export_as_document(&self) -> Result<PathBuf> {
        let artifact = self.artifact().ok_or(BoothError::NothingToExport)?;
        let Some(_active) = ActivityGuard::acquire(&self.exporting, &self.bus, Activity::Export)
        else {
            return Err(BoothError::Busy {
                operation: "export",
            });
        };

        let exporter = &self.platform.exporter;
        let html = two_up_html(&artifact.encoded);
        let document = exporter
            .render_to_document(&html)
            .await
            .map_err(into_export)?;
        exporter
            .present_print_dialog(&document)
            .await
            .map_err(into_export)?;

        info!(document = %document.display(), "Exported strip");
        self.bus.emit(BoothEvent::Exported {
            document: document.clone(),
        });
        Ok(document)
    }

    /// Hand the strip file to the share sheet.
    ///
    /// # Errors
    ///
    /// [`BoothError::NothingToShare`] without an artifact,
    /// [`BoothError::Busy`] while another share runs,
    /// [`BoothError::ShareUnavailable`] if sharing is not possible here, and
    /// [`BoothError::Share`] if the share itself fails.
    #[instrument(skip(self))]
    pub async fn share_artifact(&self) -> Result<()> {
        let artifact = self.artifact().ok_or(BoothError::NothingToShare)?;
        let Some(_active) = ActivityGuard::acquire(&self.sharing, &self.bus, Activity::Share) else {
            return Err(BoothError::Busy { operation: "share" });
        };

        let share = &self.platform.share;
        if !share.is_available().await {
            return Err(BoothError::ShareUnavailable);
        }
        share
            .share(&artifact.path, PNG_MIME, PNG_UTI)
            .await
            .map_err(|e| match e {
                BoothError::Share(_) | BoothError::ShareUnavailable => e,
                other => BoothError::Share(other.to_string()),
            })?;

        self.bus.emit(BoothEvent::Shared {
            path: artifact.path.clone(),
        });
        Ok(())
    }

    /// Drop the current artifact and its file.
    ///
    /// Waits for an in-flight build to finish first.
    ///
    /// # Errors
    ///
    /// Returns [`BoothError::Busy`] while an export or share is running.
    pub async fn reset(&self) -> Result<()> {
        let export = BusyGuard::acquire(&self.exporting);
        let share = BusyGuard::acquire(&self.sharing);
        let (Some(_export), Some(_share)) = (export, share) else {
            return Err(BoothError::Busy { operation: "retake" });
        };

        let _build = self.build_lock.lock().await;
        self.discard().await;
        *lock(&self.state) = BuildState::Idle;
        Ok(())
    }

    async fn discard(&self) {
        let previous = std::mem::take(&mut *lock(&self.state));
        if let BuildState::Ready(artifact) = previous {
            debug!(path = %artifact.path.display(), "Discarding previous strip");
            if let Err(e) = tokio::fs::remove_file(&artifact.path).await {
                warn!(path = %artifact.path.display(), error = %e, "Could not remove strip file");
            }
        }
    }
}

fn into_export(e: BoothError) -> BoothError {
    match e {
        BoothError::Export(_) => e,
        other => BoothError::Export(other.to_string()),
    }
}
