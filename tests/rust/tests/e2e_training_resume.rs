//! End-to-end training resume simulation
//!
//! Simulates a realistic interrupted-training scenario:
//! - A first worker process trains for a few epochs, checkpointing each one
//! - The worker is killed before finishing
//! - A second worker process resumes from the last durable checkpoint,
//!   finishes the remaining epochs, and materializes task outputs
//! - A third resume attempt confirms nothing replays

use std::collections::BTreeMap;

use checkpoint::{BincodeState, CheckpointStore};
use experiment_core::{CheckpointVariant, FigureConfig};
use image::{DynamicImage, RgbImage};
use outputs::{OutputBundle, OutputWriter, RasterFigure, SummaryDoc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use storage::OutputLayout;
use tempfile::TempDir;

const TASK_ID: u32 = 4;
const TASK_NAME: &str = "train_cnn";
const TOTAL_EPOCHS: i64 = 5;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FakeModel {
    weights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FakeOptimizer {
    momentum: Vec<f64>,
}

/// One simulated epoch: nudge the weights so state is distinguishable
/// between epochs.
fn train_epoch(model: &mut FakeModel, optimizer: &mut FakeOptimizer, epoch: i64) {
    for w in &mut model.weights {
        *w += 0.1 * (epoch + 1) as f64;
    }
    optimizer.momentum = model.weights.iter().map(|w| w * 0.9).collect();
}

fn run_worker(root: &std::path::Path, stop_after: i64) -> (i64, FakeModel) {
    let layout = OutputLayout::new(root);
    let store = CheckpointStore::new(layout);

    let mut model = BincodeState(FakeModel {
        weights: vec![0.0; 8],
    });
    let mut optimizer = BincodeState(FakeOptimizer {
        momentum: vec![0.0; 8],
    });

    let resume = store
        .load(
            TASK_NAME,
            TASK_ID,
            Some(&mut model),
            Some(&mut optimizer),
            &["best_acc"],
        )
        .unwrap();

    let mut best_acc = resume.extra.get("best_acc").and_then(|v| {
        v.as_ref().and_then(|v| v.as_f64())
    });

    let mut epochs_run = 0;
    for epoch in resume.start_epoch..TOTAL_EPOCHS {
        if epochs_run == stop_after {
            break; // worker killed here
        }
        train_epoch(&mut model.0, &mut optimizer.0, epoch);

        let acc = 0.5 + 0.1 * epoch as f64;
        let mut extra = BTreeMap::new();
        if best_acc.map_or(true, |best| acc > best) {
            best_acc = Some(acc);
            store
                .save_best(
                    TASK_NAME,
                    TASK_ID,
                    &model,
                    Some(&optimizer),
                    BTreeMap::from([("best_acc".to_string(), json!(acc))]),
                )
                .unwrap();
        }
        extra.insert("best_acc".to_string(), json!(best_acc));

        store
            .save(
                TASK_NAME,
                TASK_ID,
                epoch,
                &model,
                Some(&optimizer),
                extra,
                CheckpointVariant::Last,
            )
            .unwrap();
        epochs_run += 1;
    }

    (resume.start_epoch, model.0)
}

#[test]
fn test_interrupted_training_resumes_without_replay() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("outputs");

    // First worker: cold start, killed after 3 epochs (epochs 0, 1, 2).
    let (start, _) = run_worker(&root, 3);
    assert_eq!(start, 0);

    // Second worker: resumes strictly after the last completed epoch.
    let (start, final_model) = run_worker(&root, i64::MAX);
    assert_eq!(start, 3);

    // Third worker: nothing left to run, and the restored weights match
    // the second worker's final state exactly.
    let layout = OutputLayout::new(&root);
    let store = CheckpointStore::new(layout);
    let mut restored = BincodeState(FakeModel { weights: vec![] });
    let resume = store
        .load(TASK_NAME, TASK_ID, Some(&mut restored), None, &["best_acc"])
        .unwrap();
    assert_eq!(resume.start_epoch, TOTAL_EPOCHS);
    assert_eq!(restored.0, final_model);
    assert_eq!(
        resume.extra["best_acc"],
        Some(json!(0.5 + 0.1 * (TOTAL_EPOCHS - 1) as f64))
    );
}

#[test]
fn test_outputs_materialize_alongside_checkpoints() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("outputs");

    run_worker(&root, i64::MAX);

    let layout = OutputLayout::new(&root);
    let writer = OutputWriter::new(layout.clone(), FigureConfig::default());

    let figure = RasterFigure::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        4,
        4,
        image::Rgb([64, 128, 255]),
    )));
    let saved = writer
        .save(
            TASK_ID,
            &OutputBundle::new()
                .figure("loss_curve", &figure)
                .metrics(BTreeMap::from([
                    ("final_acc".to_string(), json!(0.9)),
                    ("epochs".to_string(), json!(TOTAL_EPOCHS)),
                ]))
                .summary(
                    SummaryDoc::new()
                        .title("CNN training")
                        .finding("Resumed training converged.")
                        .result("final_acc", json!(0.9))
                        .visualization("figures/loss_curve.png"),
                ),
        )
        .unwrap();

    // Full task namespace on disk.
    let ns = layout.task(TASK_ID).unwrap();
    assert!(ns
        .checkpoint_path(TASK_NAME, CheckpointVariant::Last)
        .exists());
    assert!(ns
        .checkpoint_path(TASK_NAME, CheckpointVariant::Best)
        .exists());
    assert!(ns.figures_dir().join("loss_curve.png").exists());

    let metrics: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&saved["metrics"]).unwrap()).unwrap();
    assert_eq!(metrics["epochs"], TOTAL_EPOCHS);

    let summary = std::fs::read_to_string(&saved["summary"]).unwrap();
    assert!(summary.starts_with(&format!("# Task {}: CNN training", TASK_ID)));
    assert!(summary.contains("- **final_acc**: 0.9"));
}
