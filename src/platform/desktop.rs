//! File-system backed platform services for desktop kiosks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{DocumentExporter, Permission, PhotoLibrary, ShareSheet};
use crate::error::{BoothError, Result};

/// A "photo library" that is just a directory of timestamped copies.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    dir: Option<PathBuf>,
}

impl DirectoryLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// A library that always denies access.
    pub const fn disabled() -> Self {
        Self { dir: None }
    }

    /// `None` switches the library off.
    pub fn from_option(dir: Option<&Path>) -> Self {
        dir.map_or_else(Self::disabled, Self::new)
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

#[async_trait]
impl PhotoLibrary for DirectoryLibrary {
    /// Granted when the library directory exists or can be created.
    async fn request_permission(&self) -> Permission {
        let Some(dir) = &self.dir else {
            debug!("Library disabled");
            return Permission::Denied;
        };
        match tokio::fs::create_dir_all(dir).await {
            Ok(()) => Permission::Granted,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Library directory unavailable");
                Permission::Denied
            }
        }
    }

    #[instrument(skip(self))]
    async fn save(&self, path: &Path) -> Result<PathBuf> {
        let dir = self.dir.as_ref().ok_or(BoothError::PermissionDenied)?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let short = Uuid::new_v4().simple().to_string();
        let target = dir.join(format!("photobooth-{stamp}-{}.png", &short[..8]));

        tokio::fs::copy(path, &target).await?;
        debug!(target = %target.display(), "Saved strip to library");
        Ok(target)
    }
}

/// Writes export documents as `.html` files and optionally hands them to a
/// print command.
///
/// The document is the two-up HTML page itself, not a PDF. Turning it into
/// paper or PDF is left to the print command (e.g. a browser in headless
/// print mode or `lp`).
#[derive(Debug, Clone)]
pub struct FileDocumentExporter {
    dir: PathBuf,
    print_command: Option<String>,
}

impl FileDocumentExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            print_command: None,
        }
    }

    /// Run `command <document>` to print. The command is split on
    /// whitespace; no shell is involved.
    #[must_use]
    pub fn with_print_command(mut self, command: Option<String>) -> Self {
        self.print_command = command.filter(|c| !c.trim().is_empty());
        self
    }
}

#[async_trait]
impl DocumentExporter for FileDocumentExporter {
    async fn render_to_document(&self, html: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| BoothError::Export(format!("{}: {e}", self.dir.display())))?;

        let path = self.dir.join(format!("strip-{}.html", Uuid::new_v4()));
        tokio::fs::write(&path, html)
            .await
            .map_err(|e| BoothError::Export(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = html.len(), "Wrote export document");
        Ok(path)
    }

    async fn present_print_dialog(&self, document: &Path) -> Result<()> {
        let Some(command) = &self.print_command else {
            info!(document = %document.display(), "Document ready to print");
            return Ok(());
        };

        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| BoothError::Export("empty print command".to_string()))?;
        let status = Command::new(program)
            .args(parts)
            .arg(document)
            .status()
            .await
            .map_err(|e| BoothError::Export(format!("cannot run {program}: {e}")))?;

        if status.success() {
            info!(document = %document.display(), program, "Sent document to printer");
            Ok(())
        } else {
            Err(BoothError::Export(format!("{program} exited with {status}")))
        }
    }
}

/// Shares by dropping a copy into a target directory, if one is configured.
#[derive(Debug, Clone, Default)]
pub struct DirectoryShareSheet {
    target: Option<PathBuf>,
}

impl DirectoryShareSheet {
    pub fn new(target: Option<PathBuf>) -> Self {
        Self { target }
    }
}

#[async_trait]
impl ShareSheet for DirectoryShareSheet {
    async fn is_available(&self) -> bool {
        self.target.is_some()
    }

    async fn share(&self, path: &Path, mime: &str, uti: &str) -> Result<()> {
        let target = self.target.as_ref().ok_or(BoothError::ShareUnavailable)?;
        let name = path
            .file_name()
            .ok_or_else(|| BoothError::Share(format!("{} has no file name", path.display())))?;

        tokio::fs::create_dir_all(target)
            .await
            .map_err(|e| BoothError::Share(e.to_string()))?;
        let dest = target.join(name);
        tokio::fs::copy(path, &dest)
            .await
            .map_err(|e| BoothError::Share(e.to_string()))?;
        info!(dest = %dest.display(), mime, uti, "Shared strip");
        Ok(())
    }
}
