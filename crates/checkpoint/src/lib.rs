//! Checkpoint persistence for resumable experiment tasks
//!
//! Persists and restores named, versioned training state (epoch counter,
//! model and optimizer blobs, arbitrary extra fields) per task, with
//! atomic replacement so a resuming process never observes a partial
//! record.

pub mod record;
pub mod state;
pub mod store;

pub use record::CheckpointRecord;
pub use state::{BincodeState, TrainState};
pub use store::{CheckpointStore, Resume};
