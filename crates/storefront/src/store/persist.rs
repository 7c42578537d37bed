//! Write-through persistence for [`Reducer`] states.
//!
//! Values are stored as a versioned envelope:
//!
//! ```json
//! {"state": { ... snapshot ... }, "version": 0}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Reducer;
use crate::storage::{ClientStorage, StorageError};

/// Errors from saving or loading a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The snapshot could not be encoded or the stored value is not valid JSON
    /// for the snapshot type.
    #[error("Corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The stored envelope was written by an incompatible version.
    #[error("Snapshot version {found} does not match expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    state: &'a T,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

/// Serialize the state's snapshot and write it under the state's key.
///
/// # Errors
///
/// Returns an error if encoding or the backend write fails.
pub fn save<S: Reducer>(storage: &dyn ClientStorage, state: &S) -> Result<(), PersistError> {
    let snapshot = state.snapshot();
    let value = serde_json::to_string(&EnvelopeRef {
        state: &snapshot,
        version: S::VERSION,
    })?;
    storage.set_item(S::STORAGE_KEY, &value)?;
    Ok(())
}

/// Read and restore the state stored under the state's key.
///
/// Returns `Ok(None)` when nothing has been stored yet.
///
/// # Errors
///
/// Returns an error if the backend read fails, the value does not decode, or
/// it was written by a different snapshot version.
pub fn load<S: Reducer>(storage: &dyn ClientStorage) -> Result<Option<S>, PersistError> {
    let Some(raw) = storage.get_item(S::STORAGE_KEY)? else {
        return Ok(None);
    };

    let envelope: Envelope<S::Snapshot> = serde_json::from_str(&raw)?;
    if envelope.version != S::VERSION {
        return Err(PersistError::VersionMismatch {
            found: envelope.version,
            expected: S::VERSION,
        });
    }

    Ok(Some(S::restore(envelope.state)))
}
