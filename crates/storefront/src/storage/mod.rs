//! Durable client storage.
//!
//! The stores mirror every mutation into a [`ClientStorage`] backend under a
//! fixed key and hydrate from it on start. Storage is a passive sink: it never
//! owns state and a failing backend must never take the cart down with it.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - process-local map, optionally with a byte quota
//! - [`FileStorage`] - one JSON file per key under a directory

mod file;

pub use file::FileStorage;

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Storage key for the persisted cart.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Storage key for the persisted recently-viewed list.
pub const RECENTLY_VIEWED_STORAGE_KEY: &str = "recently-viewed-storage";

/// Errors returned by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the value would exceed the backend's quota.
    #[error("Quota exceeded writing {key}: {needed} bytes, limit {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    /// Key contains characters the backend cannot store.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Backend cannot be used (e.g., poisoned lock).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence with `localStorage` semantics.
///
/// Methods take `&self` so a single backend can be shared by several stores.
pub trait ClientStorage: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create an empty, unbounded backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that rejects writes once the total stored bytes
    /// (keys plus values) would exceed `limit`.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(limit),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

impl ClientStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.lock()?;

        if let Some(limit) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.get_item("k").unwrap().is_none());

        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));

        storage.remove_item("k").unwrap();
        assert!(storage.get_item("k").unwrap().is_none());
    }

    #[test]
    fn test_memory_storage_remove_missing_is_ok() {
        let storage = MemoryStorage::new();
        assert!(storage.remove_item("missing").is_ok());
    }

    #[test]
    fn test_memory_storage_quota() {
        let storage = MemoryStorage::with_quota(10);
        storage.set_item("ab", "12345678").unwrap();

        let err = storage.set_item("cd", "x").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 10, .. }));

        // Replacing an existing key only counts the new value
        storage.set_item("ab", "1234").unwrap();
        assert_eq!(storage.get_item("ab").unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::InvalidKey("../etc".to_string());
        assert_eq!(err.to_string(), "Invalid storage key: ../etc");
    }
}
