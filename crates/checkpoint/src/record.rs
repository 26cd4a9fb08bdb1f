//! Checkpoint record format
//!
//! A record is a framed binary envelope: magic, format version, epoch,
//! the model blob, an optional optimizer blob, and a JSON section of
//! caller-defined extra fields. Blobs stay opaque; only the envelope is
//! interpreted here.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use experiment_core::{EpochIndex, Error, Result};
use serde_json::Value;

/// Magic bytes for checkpoint record files
pub const RECORD_MAGIC: [u8; 4] = *b"XCKP";

/// Checkpoint record format version
pub const RECORD_VERSION: u32 = 1;

const FLAG_HAS_OPTIMIZER: u8 = 0b0000_0001;

/// Deserialized checkpoint record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRecord {
    /// Last completed epoch ([`experiment_core::NO_EPOCHS_COMPLETED`] if none)
    pub epoch: EpochIndex,

    /// Opaque serialized model state
    pub model: Bytes,

    /// Opaque serialized optimizer state, if the save included one
    pub optim: Option<Bytes>,

    /// Caller-defined extra fields (best metric, seed, history arrays, ...)
    pub extra: BTreeMap<String, Value>,
}

impl CheckpointRecord {
    /// Stream the encoded record into `writer`
    ///
    /// Layout: magic (4), version (4, LE), epoch (8, LE), flags (1),
    /// model length (8, LE) + model bytes, optimizer length (8, LE) +
    /// optimizer bytes when present, extras length (4, LE) + extras JSON.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let extra_json = serde_json::to_vec(&self.extra)?;

        writer.write_all(&RECORD_MAGIC)?;
        writer.write_all(&RECORD_VERSION.to_le_bytes())?;
        writer.write_all(&self.epoch.to_le_bytes())?;

        let mut flags = 0u8;
        if self.optim.is_some() {
            flags |= FLAG_HAS_OPTIMIZER;
        }
        writer.write_all(&[flags])?;

        writer.write_all(&(self.model.len() as u64).to_le_bytes())?;
        writer.write_all(&self.model)?;

        if let Some(optim) = &self.optim {
            writer.write_all(&(optim.len() as u64).to_le_bytes())?;
            writer.write_all(optim)?;
        }

        writer.write_all(&(extra_json.len() as u32).to_le_bytes())?;
        writer.write_all(&extra_json)?;

        Ok(())
    }

    /// Encode the record into a byte buffer
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(
            32 + self.model.len() + self.optim.as_ref().map_or(0, |o| o.len()),
        );
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Decode a record read from `path`
    ///
    /// Any framing violation is fatal: a record that cannot be decoded in
    /// full is reported as corrupt rather than partially recovered.
    pub fn decode(path: &Path, data: &[u8]) -> Result<Self> {
        let corrupt = |reason: &str| Error::CheckpointCorrupted {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };

        let mut cursor = Cursor { data, pos: 0 };

        let magic = cursor.take(4).ok_or_else(|| corrupt("truncated header"))?;
        if magic != RECORD_MAGIC {
            return Err(corrupt("bad magic bytes"));
        }

        let version = cursor.u32_le().ok_or_else(|| corrupt("truncated header"))?;
        if version != RECORD_VERSION {
            return Err(corrupt(&format!("unsupported format version {}", version)));
        }

        let epoch = cursor.i64_le().ok_or_else(|| corrupt("truncated header"))?;
        let flags = cursor.u8().ok_or_else(|| corrupt("truncated header"))?;

        let model_len = cursor.u64_le().ok_or_else(|| corrupt("truncated model section"))?;
        let model = cursor
            .take(model_len as usize)
            .ok_or_else(|| corrupt("truncated model section"))?;

        let optim = if flags & FLAG_HAS_OPTIMIZER != 0 {
            let optim_len = cursor
                .u64_le()
                .ok_or_else(|| corrupt("truncated optimizer section"))?;
            let optim = cursor
                .take(optim_len as usize)
                .ok_or_else(|| corrupt("truncated optimizer section"))?;
            Some(Bytes::copy_from_slice(optim))
        } else {
            None
        };

        let extra_len = cursor.u32_le().ok_or_else(|| corrupt("truncated extras section"))?;
        let extra_json = cursor
            .take(extra_len as usize)
            .ok_or_else(|| corrupt("truncated extras section"))?;
        let extra: BTreeMap<String, Value> = serde_json::from_slice(extra_json)
            .map_err(|e| corrupt(&format!("invalid extras JSON: {}", e)))?;

        if cursor.pos != data.len() {
            return Err(corrupt("trailing bytes after record"));
        }

        Ok(Self {
            epoch,
            model: Bytes::copy_from_slice(model),
            optim,
            extra,
        })
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        if end > self.data.len() {
            return None;
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u32_le(&mut self) -> Option<u32> {
        self.take(4).map(|b| u32::from_le_bytes(b.try_into().unwrap()))
    }

    fn u64_le(&mut self) -> Option<u64> {
        self.take(8).map(|b| u64::from_le_bytes(b.try_into().unwrap()))
    }

    fn i64_le(&mut self) -> Option<i64> {
        self.take(8).map(|b| i64::from_le_bytes(b.try_into().unwrap()))
    }
}
