//! Path resolution for config files.
//!
//! Supports absolute paths, paths relative to the config file, and "~" home
//! directory expansion.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::device::FRAME_EXTENSIONS;
use crate::error::{BoothError, Result};

/// Resolve a path from a config file.
///
/// Resolution rules:
/// 1. Paths starting with `~`: expanded to home directory
/// 2. Absolute paths: used as-is
/// 3. Relative paths: resolved relative to `base`
pub fn resolve_path(path: &Path, base: &Path) -> Result<PathBuf> {
    trace!(path = %path.display(), base = %base.display(), "Resolving path");

    let path_str = path.to_string_lossy();
    if path_str == "~" || path_str.starts_with("~/") {
        let home = home_dir()?;
        let resolved = match path_str.strip_prefix("~/") {
            Some(rest) if !rest.is_empty() => home.join(rest),
            _ => home,
        };
        debug!(original = %path.display(), resolved = %resolved.display(), "Expanded home directory");
        return Ok(resolved);
    }

    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(base.join(path))
}

/// The user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| BoothError::ConfigInvalid("Could not determine home directory".to_string()))
}

/// Where the config file lives when none is given.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("photobooth")
        .join("config.toml")
}

/// Check that `path` is an existing image file of a supported type.
pub fn validate_image_path(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(BoothError::ImageNotFound {
            path: path.display().to_string(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some(ext) if FRAME_EXTENSIONS.contains(&ext) => Ok(()),
        Some(other) => Err(BoothError::ImageFormat(format!(".{other}"))),
        None => Err(BoothError::ImageFormat(format!(
            "{} has no extension",
            path.display()
        ))),
    }
}
