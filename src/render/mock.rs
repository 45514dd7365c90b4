//! Rasterizer double for tests.
//!
//! Wraps a real [`ImageRasterizer`] so artifacts are genuine PNGs, while
//! letting tests fail the render or withhold the layout acknowledgement.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ImageRasterizer, RasterOutput, Rasterizer, StripScene};
use crate::error::{BoothError, Result};

#[derive(Debug)]
pub struct MockRasterizer {
    inner: ImageRasterizer,
    never_ready: bool,
    fail_next: AtomicBool,
    ready_checks: AtomicUsize,
    renders: AtomicUsize,
}

impl MockRasterizer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: ImageRasterizer::new(out_dir),
            never_ready: false,
            fail_next: AtomicBool::new(false),
            ready_checks: AtomicUsize::new(0),
            renders: AtomicUsize::new(0),
        }
    }

    /// Never acknowledge layout, forcing the settle fallback.
    #[must_use]
    pub fn never_ready(mut self) -> Self {
        self.never_ready = true;
        self
    }

    /// Fail the next rasterization.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn ready_checks(&self) -> usize {
        self.ready_checks.load(Ordering::SeqCst)
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Rasterizer for MockRasterizer {
    async fn layout_ready(&self, _scene: &StripScene) -> bool {
        self.ready_checks.fetch_add(1, Ordering::SeqCst);
        if self.never_ready {
            std::future::pending::<()>().await;
        }
        true
    }

    async fn rasterize(&self, scene: &StripScene) -> Result<RasterOutput> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BoothError::Build("injected rasterizer failure".to_string()));
        }
        self.inner.rasterize(scene).await
    }
}
