//! Atomic file writes for persisted tree and coverage state.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Write `bytes` to `path` through a sibling `.tmp` file and a rename, so a
/// reader sees either the old contents or the new ones.
///
/// Failures carry [`ErrorCode::StorageWrite`](crate::ErrorCode::StorageWrite)
/// and name the file that could not be written.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| Error::storage_write(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::storage_write(path, e));
    }
    Ok(())
}
