//! Storage - Atomic writes and task namespaces on a durable volume
//!
//! Provides the write discipline shared by every component that touches
//! the output root:
//! - Atomic file replacement (write to a same-directory temp, then rename)
//! - Lazy, idempotent task directory creation
//! - The durable-volume commit capability consumed by the run driver
//!
//! # Example
//!
//! ```no_run
//! use storage::{write_atomic, OutputLayout};
//!
//! # fn example() -> experiment_core::Result<()> {
//! let layout = OutputLayout::new("/mnt/outputs");
//! let ns = layout.task(3)?;
//! write_atomic(ns.metrics_path(), br#"{"loss": 0.21}"#)?;
//! # Ok(())
//! # }
//! ```

mod atomic;
mod namespace;
mod volume;

pub use atomic::{write_atomic, write_atomic_with, write_json_atomic};
pub use namespace::{OutputLayout, TaskNamespace};
pub use volume::{DurableVolume, NoopVolume};
