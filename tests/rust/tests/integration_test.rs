//! Full-flow integration test: selection, execution, checkpointing,
//! output aggregation, and durable commits working together

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use checkpoint::{BincodeState, CheckpointStore};
use experiment_core::{CheckpointVariant, DriverConfig, FigureConfig, Result, RunStatus};
use outputs::{OutputBundle, OutputWriter, SummaryDoc};
use run_driver::{MarkerSelector, RunDriver, Unit};
use serde_json::json;
use storage::{DurableVolume, OutputLayout};
use tempfile::TempDir;

#[derive(Default)]
struct CountingVolume {
    commits: Cell<usize>,
}

impl DurableVolume for CountingVolume {
    fn commit(&self) -> Result<()> {
        self.commits.set(self.commits.get() + 1);
        Ok(())
    }
}

#[test]
fn test_full_flow() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("outputs");
    let layout = OutputLayout::new(&root);

    let store = Rc::new(CheckpointStore::new(layout.clone()));
    let writer = Rc::new(OutputWriter::new(layout.clone(), FigureConfig::default()));
    let model = Rc::new(RefCell::new(BincodeState(vec![0.0f64; 4])));

    // Setup unit: write the run config manifest.
    let setup_writer = writer.clone();
    let setup = Unit::new("seed = 0; save_config()", move || {
        setup_writer.save_config(&json!({"seed": 0, "batch_size": 128}))?;
        Ok(())
    });

    // Task 1 training unit: one epoch plus a checkpoint.
    let train_store = store.clone();
    let train_model = model.clone();
    let train = Unit::new("# task1: train probe model", move || {
        let mut model = train_model.borrow_mut();
        for w in &mut model.0 {
            *w += 1.0;
        }
        train_store.save(
            "probe",
            1,
            0,
            &*model,
            None,
            BTreeMap::from([("seed".to_string(), json!(0))]),
            CheckpointVariant::Last,
        )?;
        Ok(())
    });

    // Task 1 wrap-up unit: metrics and summary; its source carries a
    // completion marker, which forces an extra commit.
    let finish_writer = writer.clone();
    let finish = Unit::new("print('task1 completed')", move || {
        finish_writer.save(
            1,
            &OutputBundle::new()
                .metrics(BTreeMap::from([("acc".to_string(), json!(0.88))]))
                .summary(SummaryDoc::new().title("Probe").finding("Learned the bias.")),
        )?;
        Ok(())
    });

    // Task 2 unit must be skipped by the selector; failing proves it ran.
    let task2 = Unit::new("# task2: long finetune", || {
        anyhow::bail!("task2 should not have executed")
    });

    let mut units = vec![setup, train, finish, task2];

    let volume = CountingVolume::default();
    let driver = RunDriver::new(layout.clone(), &volume, DriverConfig::default()).unwrap();
    let selector = MarkerSelector::new("task1").bounded_by("task2");
    let report = driver.run(&mut units, Some(&selector)).unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.units_executed, 3);
    assert_eq!(report.error_count, 0);
    assert_eq!(report.output_location, root);
    // Completion-marker commit plus the final commit.
    assert_eq!(volume.commits.get(), 2);

    // Everything the units wrote is on disk under the namespace.
    assert!(layout.config_path().exists());
    let ns = layout.task(1).unwrap();
    assert!(ns.checkpoint_path("probe", CheckpointVariant::Last).exists());
    assert!(ns.metrics_path().exists());
    assert!(ns.summary_path().exists());

    // A fresh store resumes past the checkpointed epoch.
    let mut restored = BincodeState(Vec::<f64>::new());
    let resume = CheckpointStore::new(layout)
        .load("probe", 1, Some(&mut restored), None, &["seed"])
        .unwrap();
    assert_eq!(resume.start_epoch, 1);
    assert_eq!(restored.0, vec![1.0; 4]);
    assert_eq!(resume.extra["seed"], Some(json!(0)));
}

#[test]
fn test_failed_units_leave_partial_outputs_durable() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("outputs");
    let layout = OutputLayout::new(&root);

    let writer = Rc::new(OutputWriter::new(layout.clone(), FigureConfig::default()));

    let early_writer = writer.clone();
    let early = Unit::new("save early metrics", move || {
        early_writer.save(
            2,
            &OutputBundle::new()
                .metrics(BTreeMap::from([("progress".to_string(), json!(0.4))])),
        )?;
        Ok(())
    });
    let crash = Unit::new("gpu step", || anyhow::bail!("CUDA out of memory"));

    let mut units = vec![early, crash];
    let volume = CountingVolume::default();
    let driver = RunDriver::new(layout.clone(), &volume, DriverConfig::default()).unwrap();
    let report = driver.run(&mut units, None).unwrap();

    assert_eq!(report.units_executed, 1);
    assert_eq!(report.error_count, 1);
    assert!(report.failures[0].message.contains("CUDA"));
    // Failure commit plus final commit: the early metrics were made
    // durable despite the later failure.
    assert_eq!(volume.commits.get(), 2);
    assert!(layout.task(2).unwrap().metrics_path().exists());

    // The report itself serializes for the submission layer.
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"error_count\":1"));
}
