//! Run configuration for deep feature synthesis.
//!
//! Loaded from TOML; the cutoff time is supplied programmatically.

mod settings;

pub use settings::{DfsConfig, DEFAULT_MAX_DEPTH};
