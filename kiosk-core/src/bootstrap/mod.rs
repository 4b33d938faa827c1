//! Bootstrap helpers shared by the server and display binaries
//!
//! This module handles:
//! - Configuration loading and validation

pub mod config;

pub use config::load_config;
