//! Runtime configuration types
//!
//! All paths and policies are threaded explicitly through constructors;
//! there is no process-wide mutable output root. Point `storage.root` at a
//! mounted durable volume before constructing any component to redirect
//! every subsequent write.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main experiment configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Storage settings
    pub storage: StorageConfig,

    /// Figure rendering settings
    pub figures: FigureConfig,

    /// Run driver settings
    pub driver: DriverConfig,
}

impl ExperimentConfig {
    /// Validate the configuration, rejecting values that would silently
    /// misbehave at run time
    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.figures.validate()?;
        self.driver.validate()
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all task namespaces
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("outputs"),
        }
    }
}

impl StorageConfig {
    /// Validate this section
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::InvalidConfig {
                message: "storage root must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Figure rendering configuration
///
/// Figures are rasterized at a fixed resolution suitable for inclusion in
/// a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureConfig {
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
        }
    }
}

impl FigureConfig {
    /// Validate this section
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig {
                message: "figure resolution must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Run driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Commit the durable volume after this many successful units
    pub commit_interval: usize,

    /// Substrings (lowercase) marking a unit as the end of a task; a match
    /// triggers an extra durable commit
    pub completion_markers: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            commit_interval: 5,
            completion_markers: ["done", "completed", "finished", "summary"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl DriverConfig {
    /// Validate this section
    pub fn validate(&self) -> Result<()> {
        if self.commit_interval == 0 {
            return Err(Error::InvalidConfig {
                message: "commit interval must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
