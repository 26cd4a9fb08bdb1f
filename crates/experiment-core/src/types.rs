//! Core type definitions for the experiment persistence runtime

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Numbered unit of experimental work with its own output namespace
pub type TaskId = u32;

/// Training epoch counter
///
/// Signed so that [`NO_EPOCHS_COMPLETED`] can mark a checkpoint written
/// before the first epoch finished.
pub type EpochIndex = i64;

/// Sentinel epoch meaning "no epochs completed yet"
pub const NO_EPOCHS_COMPLETED: EpochIndex = -1;

/// Checkpoint variant selector
///
/// `Last` is the resume point and is overwritten on every save; `Best` is
/// refreshed only when the caller decides the current state beats the
/// previous best.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CheckpointVariant {
    /// Most recent successfully completed save
    Last,

    /// Best state seen so far by the caller's own metric
    Best,
}

impl CheckpointVariant {
    /// File-name suffix for this variant
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointVariant::Last => "last",
            CheckpointVariant::Best => "best",
        }
    }
}

impl std::fmt::Display for CheckpointVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of a driver run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunStatus {
    /// The run reached the final commit (some units may have failed)
    Completed,

    /// A task filter was given and no unit matched it; nothing executed
    TaskNotFound,
}

/// A recorded per-unit execution failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitFailure {
    /// Position of the failing unit in the sequence
    pub index: usize,

    /// Error message reported by the unit
    pub message: String,
}

/// Structured result of a driver run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Outcome of the run
    pub status: RunStatus,

    /// Number of units executed successfully
    pub units_executed: usize,

    /// Number of units that failed
    pub error_count: usize,

    /// Index and message for each failed unit
    pub failures: Vec<UnitFailure>,

    /// Output root the run wrote under
    pub output_location: PathBuf,
}
