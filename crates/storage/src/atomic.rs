//! Atomic file replacement
//!
//! Every write lands in a temporary file in the same directory as the
//! destination, then renames onto it. The same-directory requirement keeps
//! the rename a single-filesystem metadata operation; an observer sees
//! either the previous content or the complete new content, never a
//! truncated intermediate.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use experiment_core::{Error, Result};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Generate a unique temporary sibling for `dest`
fn temp_sibling(dest: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        dest.file_name().unwrap_or_default().to_string_lossy(),
        Uuid::new_v4()
    );
    dest.with_file_name(temp_name)
}

/// Ensure the parent directory of `dest` exists (no-op if present)
fn ensure_parent(dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Storage {
            message: format!("Failed to create directory {:?}: {}", parent, e),
        })?;
    }
    Ok(())
}

/// Atomically replace `dest` with `data`
///
/// On any failure before the rename completes, the temporary file is
/// removed and the error propagated; `dest` is left untouched.
pub fn write_atomic<P: AsRef<Path>>(dest: P, data: &[u8]) -> Result<()> {
    let dest = dest.as_ref();
    ensure_parent(dest)?;
    let temp_path = temp_sibling(dest);

    debug!(?dest, ?temp_path, size = data.len(), "Writing file atomically");

    let result = (|| {
        let mut file = File::create(&temp_path).map_err(|e| Error::Storage {
            message: format!("Failed to create temp file {:?}: {}", temp_path, e),
        })?;

        file.write_all(data).map_err(|e| Error::Storage {
            message: format!("Failed to write data: {}", e),
        })?;

        file.sync_all().map_err(|e| Error::Storage {
            message: format!("Failed to sync file: {}", e),
        })?;

        fs::rename(&temp_path, dest).map_err(|e| Error::Storage {
            message: format!("Failed to rename {:?} to {:?}: {}", temp_path, dest, e),
        })
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Atomically replace `dest` using a caller-supplied serializer
///
/// For payloads too large or too specialized to materialize as a byte
/// slice first: the serializer writes directly to a `.tmp`-suffixed
/// sibling, which is then renamed onto `dest`. Cleanup and error
/// propagation match [`write_atomic`].
pub fn write_atomic_with<P, F>(dest: P, serialize: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&Path) -> Result<()>,
{
    let dest = dest.as_ref();
    ensure_parent(dest)?;

    let mut temp_name = dest.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = dest.with_file_name(temp_name);

    let result = serialize(&temp_path).and_then(|()| {
        fs::rename(&temp_path, dest).map_err(|e| Error::Storage {
            message: format!("Failed to rename {:?} to {:?}: {}", temp_path, dest, e),
        })
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Atomically replace `dest` with pretty-printed JSON
pub fn write_json_atomic<P: AsRef<Path>, T: Serialize>(dest: P, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    write_atomic(dest, &data)
}
