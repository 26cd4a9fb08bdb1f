//! State capture capability
//!
//! The checkpoint format is polymorphic over the serialization scheme:
//! anything that can capture itself into bytes and restore from them can
//! be checkpointed. [`BincodeState`] is the batteries-included container
//! for plain serde-serializable state.

use bytes::Bytes;
use experiment_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Capability to snapshot and restore opaque training state
///
/// The analogue of a model's state-dict pair: `capture` serializes the
/// current weights, `restore` applies a previously captured blob in place.
pub trait TrainState {
    /// Serialize the current state into an opaque blob
    fn capture(&self) -> Result<Bytes>;

    /// Apply a previously captured blob to this state
    fn restore(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Bincode-backed state container for serde-serializable values
#[derive(Debug, Clone, PartialEq)]
pub struct BincodeState<T>(pub T);

impl<T> TrainState for BincodeState<T>
where
    T: Serialize + DeserializeOwned,
{
    fn capture(&self) -> Result<Bytes> {
        bincode::serialize(&self.0)
            .map(Bytes::from)
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        self.0 = bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(())
    }
}
