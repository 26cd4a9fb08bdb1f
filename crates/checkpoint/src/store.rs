//! Checkpoint store: save and resume per-task training state

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use experiment_core::{
    CheckpointVariant, EpochIndex, Error, Result, TaskId, NO_EPOCHS_COMPLETED,
};
use serde_json::Value;
use storage::{write_atomic_with, OutputLayout};
use tracing::{debug, info};

use crate::record::CheckpointRecord;
use crate::state::TrainState;

/// Outcome of a resume attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resume {
    /// First epoch still to run: one past the last completed epoch, or 0
    /// on a cold start
    pub start_epoch: EpochIndex,

    /// Requested extra fields; a key absent from the record maps to `None`
    pub extra: BTreeMap<String, Option<Value>>,
}

impl Resume {
    fn cold_start() -> Self {
        Self {
            start_epoch: 0,
            extra: BTreeMap::new(),
        }
    }
}

/// Persists and restores named checkpoint records under task namespaces
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    layout: OutputLayout,
}

impl CheckpointStore {
    /// Create a store writing under `layout`
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    /// Save a checkpoint record for `(task_name, variant)`
    ///
    /// The record is encoded to a temp sibling and renamed into place, so
    /// a concurrent or subsequent load sees either the previous record or
    /// this one in full. Returns the path written.
    pub fn save(
        &self,
        task_name: &str,
        task_id: TaskId,
        epoch: EpochIndex,
        model: &dyn TrainState,
        optimizer: Option<&dyn TrainState>,
        extra: BTreeMap<String, Value>,
        variant: CheckpointVariant,
    ) -> Result<PathBuf> {
        let ns = self.layout.task(task_id)?;
        let path = ns.checkpoint_path(task_name, variant);

        let record = CheckpointRecord {
            epoch,
            model: model.capture()?,
            optim: optimizer.map(|o| o.capture()).transpose()?,
            extra,
        };

        write_atomic_with(&path, |tmp| {
            let mut writer = BufWriter::new(File::create(tmp)?);
            record.write_to(&mut writer)?;
            let file = writer
                .into_inner()
                .map_err(|e| Error::Io(e.into_error()))?;
            file.sync_all()?;
            Ok(())
        })?;

        info!(
            task = task_name,
            task_id,
            %variant,
            epoch,
            path = %path.display(),
            "Checkpoint written"
        );

        Ok(path)
    }

    /// Save the `best` variant without an epoch counter
    ///
    /// The caller decides what "best" means; this only refreshes the
    /// record. The `last` record is untouched.
    pub fn save_best(
        &self,
        task_name: &str,
        task_id: TaskId,
        model: &dyn TrainState,
        optimizer: Option<&dyn TrainState>,
        extra: BTreeMap<String, Value>,
    ) -> Result<PathBuf> {
        self.save(
            task_name,
            task_id,
            NO_EPOCHS_COMPLETED,
            model,
            optimizer,
            extra,
            CheckpointVariant::Best,
        )
    }

    /// Resume from the `last` record of `task_name`, if one exists
    ///
    /// Applies the stored model blob to `model` and the stored optimizer
    /// blob to `optimizer` when both sides are present. Returns
    /// `start_epoch = stored epoch + 1` so a completed epoch is never
    /// replayed, plus exactly the requested extra fields. A missing record
    /// is a cold start; a record that exists but cannot be decoded or
    /// applied is fatal.
    pub fn load(
        &self,
        task_name: &str,
        task_id: TaskId,
        model: Option<&mut dyn TrainState>,
        optimizer: Option<&mut dyn TrainState>,
        extra_keys: &[&str],
    ) -> Result<Resume> {
        let ns = self.layout.task(task_id)?;
        let path = ns.checkpoint_path(task_name, CheckpointVariant::Last);

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(task = task_name, task_id, "No checkpoint found, cold start");
                return Ok(Resume::cold_start());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let record = CheckpointRecord::decode(&path, &data)?;

        if let Some(model) = model {
            model
                .restore(&record.model)
                .map_err(|e| corrupt(&path, format!("model state rejected: {}", e)))?;
        }

        if let Some(optimizer) = optimizer {
            if let Some(blob) = &record.optim {
                optimizer
                    .restore(blob)
                    .map_err(|e| corrupt(&path, format!("optimizer state rejected: {}", e)))?;
            }
        }

        let start_epoch = record.epoch + 1;
        let extra = extra_keys
            .iter()
            .map(|key| (key.to_string(), record.extra.get(*key).cloned()))
            .collect();

        info!(
            task = task_name,
            task_id,
            path = %path.display(),
            start_epoch,
            "Resumed from checkpoint"
        );

        Ok(Resume { start_epoch, extra })
    }
}

fn corrupt(path: &Path, reason: String) -> Error {
    Error::CheckpointCorrupted {
        path: path.display().to_string(),
        reason,
    }
}
