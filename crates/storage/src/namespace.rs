//! Task output namespaces
//!
//! Maps a task id to its directory layout under the output root and
//! guarantees the layout exists before use. Resolution is a pure function
//! of (root, task id); nothing is cached, so a layout constructed against
//! a durable volume mount redirects every subsequent write.

use std::fs;
use std::path::{Path, PathBuf};

use experiment_core::{CheckpointVariant, Error, Result, StorageConfig, TaskId};
use tracing::debug;

/// File extension for checkpoint records
const CHECKPOINT_EXTENSION: &str = "ckpt";

/// Output root shared by all task namespaces
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Create a layout rooted at `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Create a layout from storage configuration
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.root.clone())
    }

    /// The output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the run config manifest: `<root>/config.json`
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Resolve the namespace for `task_id`, creating its directories
    ///
    /// Safe to call repeatedly and from concurrent workers targeting the
    /// same volume: directory creation is idempotent and never errors on
    /// an already-existing directory.
    pub fn task(&self, task_id: TaskId) -> Result<TaskNamespace> {
        let root = self.root.join(format!("task{}", task_id));
        let figures_dir = root.join("figures");
        let checkpoints_dir = root.join("checkpoints");

        for dir in [&root, &figures_dir, &checkpoints_dir] {
            fs::create_dir_all(dir).map_err(|e| Error::Storage {
                message: format!("Failed to create directory {:?}: {}", dir, e),
            })?;
        }

        debug!(task_id, ?root, "Resolved task namespace");

        Ok(TaskNamespace {
            task_id,
            root,
            figures_dir,
            checkpoints_dir,
        })
    }
}

/// Directory layout owned by one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNamespace {
    task_id: TaskId,
    root: PathBuf,
    figures_dir: PathBuf,
    checkpoints_dir: PathBuf,
}

impl TaskNamespace {
    /// The task id this namespace belongs to
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Task root: `<root>/task{N}/`
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Figures directory: `<root>/task{N}/figures/`
    pub fn figures_dir(&self) -> &Path {
        &self.figures_dir
    }

    /// Checkpoints directory: `<root>/task{N}/checkpoints/`
    pub fn checkpoints_dir(&self) -> &Path {
        &self.checkpoints_dir
    }

    /// Path of the task metrics snapshot
    pub fn metrics_path(&self) -> PathBuf {
        self.root.join("metrics.json")
    }

    /// Path of the task summary document
    pub fn summary_path(&self) -> PathBuf {
        self.root.join("summary.md")
    }

    /// Path of a named checkpoint record:
    /// `checkpoints/{task_name}_{variant}.ckpt`
    pub fn checkpoint_path(&self, task_name: &str, variant: CheckpointVariant) -> PathBuf {
        self.checkpoints_dir
            .join(format!("{}_{}.{}", task_name, variant, CHECKPOINT_EXTENSION))
    }
}
