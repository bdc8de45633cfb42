//! Tile Forge Application Library
//!
//! This crate contains the configuration, setup and utilities for the
//! Tile Forge command-line tool.

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod setup;

pub mod main;

pub use config::{AppConfig, Cli};
pub use error::AppError;

// Re-export the main function so it can be called from the root crate
pub use crate::main::main;
