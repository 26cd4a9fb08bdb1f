//! Durable volume capability
//!
//! The remote execution platform mounts storage whose writes become
//! externally visible only after an explicit commit. The run driver is the
//! sole caller of [`DurableVolume::commit`].

use experiment_core::Result;
use tracing::debug;

/// Handle to storage that requires an explicit flush to become durable
pub trait DurableVolume {
    /// Flush local writes to durable, externally visible storage
    fn commit(&self) -> Result<()>;
}

/// Volume for plain local disk, where every write is already durable
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVolume;

impl DurableVolume for NoopVolume {
    fn commit(&self) -> Result<()> {
        debug!("Commit requested on local volume (no-op)");
        Ok(())
    }
}
