//! Experiment Core - Foundation for the experiment persistence runtime
//!
//! Provides shared types, error handling, and configuration for the
//! checkpoint, output, and run-driver crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DriverConfig, ExperimentConfig, FigureConfig, StorageConfig};
pub use error::{Error, Result};
pub use types::*;
