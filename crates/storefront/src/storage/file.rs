//! File-backed storage: one `<key>.json` file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ClientStorage, StorageError};

/// Storage backend that keeps each key in its own file under a directory.
///
/// Writes go to a temporary sibling file first and are renamed into place, so
/// a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a backend rooted at `dir`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl ClientStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "freshcart-file-storage-{name}-{}",
            std::process::id()
        ))
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = temp_dir("round-trip");
        let storage = FileStorage::new(&dir);

        assert!(storage.get_item("cart-storage").unwrap().is_none());
        storage.set_item("cart-storage", r#"{"a":1}"#).unwrap();
        assert_eq!(
            storage.get_item("cart-storage").unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
        assert!(dir.join("cart-storage.json").exists());
        assert!(!dir.join("cart-storage.json.tmp").exists());

        storage.remove_item("cart-storage").unwrap();
        assert!(storage.get_item("cart-storage").unwrap().is_none());
        storage.remove_item("cart-storage").unwrap();

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let storage = FileStorage::new(temp_dir("invalid-key"));
        assert!(matches!(
            storage.set_item("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.get_item(""),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
