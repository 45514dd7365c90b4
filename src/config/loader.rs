//! Reading and writing config files.

use std::path::Path;

use tracing::{debug, info, instrument, trace};

use super::schema::BoothConfig;
use crate::error::{BoothError, Result};

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml).
    Yaml,
    /// TOML format (.toml).
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    fn for_path(path: &Path) -> Result<Self> {
        Self::from_extension(path).ok_or_else(|| {
            BoothError::ConfigParse(format!(
                "Unknown config format for '{}': expected .yaml, .yml, or .toml",
                path.display()
            ))
        })
    }
}

/// Load, resolve, and validate a config file.
///
/// Relative paths inside the file are resolved against the file's own
/// directory.
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable, its extension is
/// not recognized, it does not parse, or validation fails.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BoothConfig> {
    let path = path.as_ref();
    info!("Loading configuration file");

    let format = ConfigFormat::for_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BoothError::ConfigNotFound {
                path: path.display().to_string(),
            }
        } else {
            BoothError::Io(e)
        }
    })?;
    debug!(format = ?format, bytes = content.len(), "Read config file");

    let mut config = load_config_from_str(&content, format)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base)?;
    Ok(config)
}

/// Parse and validate config text. Paths are left as written.
///
/// # Errors
///
/// Returns an error if parsing or validation fails.
#[instrument(skip(content), fields(format = ?format, content_len = content.len()))]
pub fn load_config_from_str(content: &str, format: ConfigFormat) -> Result<BoothConfig> {
    trace!("Parsing config content");
    let config: BoothConfig = match format {
        ConfigFormat::Yaml if content.trim().is_empty() => BoothConfig::default(),
        ConfigFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| BoothError::ConfigParse(format!("YAML: {e}")))?,
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| BoothError::ConfigParse(format!("TOML: {e}")))?
        }
    };

    config.validate()?;
    info!(
        countdown_from = config.capture.countdown_from,
        facing = %config.capture.facing,
        logo = config.strip.logo.is_some(),
        "Configuration loaded and validated"
    );
    Ok(config)
}

/// Write a config file in the format its extension names.
///
/// # Errors
///
/// Returns an error if the extension is not recognized, serialization fails,
/// or the file cannot be written.
#[instrument(skip(config), fields(path = %path.as_ref().display()))]
pub fn save_config<P: AsRef<Path>>(config: &BoothConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let content = match ConfigFormat::for_path(path)? {
        ConfigFormat::Yaml => serde_yaml::to_string(config)
            .map_err(|e| BoothError::ConfigParse(format!("YAML: {e}")))?,
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| BoothError::ConfigParse(format!("TOML: {e}")))?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &content)?;
    info!(bytes = content.len(), "Configuration saved");
    Ok(())
}
