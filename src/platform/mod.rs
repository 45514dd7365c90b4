//! Platform services the booth hands its strip to.
//!
//! Each service is a trait so kiosks can plug in native integrations; the
//! [`desktop`] module has file-system backed versions and [`mock`] has
//! recording doubles for tests.

pub mod desktop;
pub mod mock;

pub use desktop::{DirectoryLibrary, DirectoryShareSheet, FileDocumentExporter};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::OutputConfig;
use crate::error::Result;

/// Answer to a photo library permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Granted,
    Denied,
}

/// The user's photo library.
#[async_trait]
pub trait PhotoLibrary: Send + Sync {
    async fn request_permission(&self) -> Permission;

    /// Save a copy of the image at `path`, returning where it landed.
    async fn save(&self, path: &Path) -> Result<PathBuf>;
}

/// Turns HTML into a printable document and drives the print flow.
#[async_trait]
pub trait DocumentExporter: Send + Sync {
    /// Render `html` to a document, returning its location.
    async fn render_to_document(&self, html: &str) -> Result<PathBuf>;

    /// Present the print flow for a rendered document.
    async fn present_print_dialog(&self, document: &Path) -> Result<()>;
}

/// The system share sheet.
#[async_trait]
pub trait ShareSheet: Send + Sync {
    async fn is_available(&self) -> bool;

    async fn share(&self, path: &Path, mime: &str, uti: &str) -> Result<()>;
}

/// Bundle of the services a compositor talks to.
#[derive(Clone)]
pub struct Platform {
    pub library: Arc<dyn PhotoLibrary>,
    pub exporter: Arc<dyn DocumentExporter>,
    pub share: Arc<dyn ShareSheet>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

impl Platform {
    /// File-system services driven by the `[output]` config table.
    pub fn desktop(output: &OutputConfig) -> Self {
        Self {
            library: Arc::new(DirectoryLibrary::from_option(output.library_dir())),
            exporter: Arc::new(
                FileDocumentExporter::new(output.strip_dir())
                    .with_print_command(output.print_command.clone()),
            ),
            share: Arc::new(DirectoryShareSheet::new(output.share_dir.clone())),
        }
    }
}
