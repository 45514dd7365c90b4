//! Recording platform doubles for tests.
//!
//! Every mock keeps a log of what it was asked to do, can be told to fail,
//! and can be slowed down to exercise the in-flight guards.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{DocumentExporter, Permission, PhotoLibrary, ShareSheet};
use crate::error::{BoothError, Result};

/// Photo library that records saves.
#[derive(Debug)]
pub struct MockLibrary {
    permission: Permission,
    save_error: Option<String>,
    permission_requests: AtomicUsize,
    saved: Mutex<Vec<PathBuf>>,
}

impl Default for MockLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self {
            permission: Permission::Granted,
            save_error: None,
            permission_requests: AtomicUsize::new(0),
            saved: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn denied() -> Self {
        Self {
            permission: Permission::Denied,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            save_error: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn saved(&self) -> Vec<PathBuf> {
        self.saved.lock().unwrap().clone()
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PhotoLibrary for MockLibrary {
    async fn request_permission(&self) -> Permission {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        self.permission
    }

    async fn save(&self, path: &Path) -> Result<PathBuf> {
        if let Some(message) = &self.save_error {
            return Err(BoothError::Other(message.clone()));
        }
        self.saved.lock().unwrap().push(path.to_path_buf());
        Ok(path.to_path_buf())
    }
}

/// Document exporter that keeps documents in memory.
#[derive(Debug, Default)]
pub struct MockExporter {
    render_error: Option<String>,
    print_error: Option<String>,
    delay: Duration,
    documents: Mutex<Vec<(PathBuf, String)>>,
    printed: Mutex<Vec<PathBuf>>,
}

impl MockExporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_render(mut self, message: &str) -> Self {
        self.render_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn failing_print(mut self, message: &str) -> Self {
        self.print_error = Some(message.to_string());
        self
    }

    /// Make every render take `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Rendered documents as `(location, html)`.
    pub fn documents(&self) -> Vec<(PathBuf, String)> {
        self.documents.lock().unwrap().clone()
    }

    pub fn printed(&self) -> Vec<PathBuf> {
        self.printed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentExporter for MockExporter {
    async fn render_to_document(&self, html: &str) -> Result<PathBuf> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = &self.render_error {
            return Err(BoothError::Export(message.clone()));
        }
        let mut documents = self.documents.lock().unwrap();
        let path = PathBuf::from(format!("mock-document-{}.html", documents.len() + 1));
        documents.push((path.clone(), html.to_string()));
        Ok(path)
    }

    async fn present_print_dialog(&self, document: &Path) -> Result<()> {
        if let Some(message) = &self.print_error {
            return Err(BoothError::Export(message.clone()));
        }
        self.printed.lock().unwrap().push(document.to_path_buf());
        Ok(())
    }
}

/// A shared item as `(path, mime, uti)`.
pub type SharedItem = (PathBuf, String, String);

/// Share sheet that records what was shared.
#[derive(Debug)]
pub struct MockShareSheet {
    available: bool,
    share_error: Option<String>,
    delay: Duration,
    shared: Mutex<Vec<SharedItem>>,
}

impl Default for MockShareSheet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockShareSheet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: true,
            share_error: None,
            delay: Duration::ZERO,
            shared: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.share_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn shared(&self) -> Vec<SharedItem> {
        self.shared.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShareSheet for MockShareSheet {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn share(&self, path: &Path, mime: &str, uti: &str) -> Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = &self.share_error {
            return Err(BoothError::Share(message.clone()));
        }
        self.shared
            .lock()
            .unwrap()
            .push((path.to_path_buf(), mime.to_string(), uti.to_string()));
        Ok(())
    }
}
