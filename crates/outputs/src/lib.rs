//! Outputs - Task artifact aggregation
//!
//! Collects heterogeneous run artifacts (figures, scalar metrics,
//! free-form summaries) and writes them under the task namespace in a
//! consistent, inspectable format. Any subset may be saved per call;
//! figures mid-run and metrics at the end is a normal usage pattern.

pub mod figure;
pub mod summary;
pub mod writer;

pub use figure::{Figure, RasterFigure};
pub use summary::{Summary, SummaryDoc};
pub use writer::{OutputBundle, OutputWriter};
