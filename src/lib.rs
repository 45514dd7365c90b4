//! Photobooth library: countdown capture, photo-strip compositing, print
//! and share.
//!
//! The `booth` CLI is a thin layer over this crate; kiosks can drive a
//! [`Booth`] directly with their own camera and platform services.
//!
//! # Modules
//!
//! - `booth`: the controller that gates user actions by session phase
//! - `sequencer`: four countdown rounds, one capture each
//! - `compositor`: strip building, library save, export and share
//! - `render`: strip layout rasterization
//! - `device`: camera abstraction (folder-backed and mock)
//! - `platform`: photo library, document export and share services
//! - `session`: session state, phases and the event bus
//! - `layout`: strip geometry
//! - `config`: configuration file handling
//! - `output`: output mode abstraction (robot/human)
#![forbid(unsafe_code)]

pub mod booth;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod device;
pub mod document;
pub mod error;
pub mod image_ops;
pub mod layout;
pub mod logging;
pub mod output;
pub mod platform;
pub mod render;
pub mod sequencer;
pub mod session;

pub use booth::{Booth, BoothBuilder, SessionOutcome};
pub use error::{BoothError, Result};
