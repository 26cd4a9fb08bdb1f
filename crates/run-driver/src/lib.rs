//! Run Driver - Resumable execution of ordered computation units
//!
//! Executes a sequence of opaque computation units strictly in order,
//! isolating per-unit failures and committing the durable volume on a
//! bounded-loss schedule so a killed worker forfeits at most one commit
//! interval of completed work.

pub mod driver;
pub mod selector;
pub mod unit;

pub use driver::RunDriver;
pub use selector::{MarkerSelector, UnitSelector};
pub use unit::Unit;
