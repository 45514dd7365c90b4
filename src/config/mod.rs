//! Booth configuration.
//!
//! Settings live in one YAML or TOML file with `capture`, `strip` and
//! `output` sections. Every field has a default, so an empty file is a
//! valid configuration.

mod loader;
mod path;
mod schema;

pub use loader::{ConfigFormat, load_config, load_config_from_str, save_config};
pub use path::{default_config_path, home_dir, resolve_path, validate_image_path};
pub use schema::{BoothConfig, CaptureConfig, OutputConfig, StripConfig};
