//! Common test utilities for the photobooth crate.
//!
//! - `cli`: runner for the `booth` binary with output assertions
//! - `env`: serialized environment variable overrides
//! - `fixtures`: test images, frame folders and config files
//! - `rig`: a compositor wired to recording doubles
#![allow(dead_code)]

pub mod cli;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
