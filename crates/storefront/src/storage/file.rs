//! File-backed key-value store.
//!
//! All entries live in one JSON object on disk. Every write rewrites the
//! whole file through a sibling temp file and a rename, so a crash mid-write
//! leaves either the old or the new contents, never a torn file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{KeyValueStore, StorageError};

/// A [`KeyValueStore`] persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts an empty store. A file that is not a JSON
    /// object of strings is logged and replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => parse_entries(&path, &contents),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened file store");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_out(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn parse_entries(path: &Path, contents: &str) -> BTreeMap<String, String> {
    if contents.trim().is_empty() {
        return BTreeMap::new();
    }
    serde_json::from_str(contents).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable storage file");
        BTreeMap::new()
    })
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        let mut next = entries.clone();
        next.insert(key.to_owned(), value.to_owned());
        // Memory only changes once the file does.
        self.write_out(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.write_out(&next)?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileStore::open(&path).unwrap();
        store.set("floa-cart", "[]").unwrap();
        store.set("favorites", "[1,2]").unwrap();
        store.remove("favorites").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("floa-cart").unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("favorites").unwrap(), None);
    }

    #[test]
    fn test_garbage_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "this is not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("floa-cart").unwrap(), None);

        store.set("floa-cart", "[]").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, r#"{"floa-cart":"[]"}"#);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let store = FileStore::open(&path).unwrap();
        store.set("floa-cart", "[]").unwrap();

        // A directory in place of the temp file makes every write fail.
        fs::create_dir(dir.path().join("storage.json.tmp")).unwrap();
        assert!(matches!(store.set("favorites", "[1]"), Err(StorageError::Io(_))));
        assert!(store.remove("floa-cart").is_err());
        assert_eq!(store.get("favorites").unwrap(), None);
        assert_eq!(store.get("floa-cart").unwrap().as_deref(), Some("[]"));

        fs::remove_dir(dir.path().join("storage.json.tmp")).unwrap();
        store.set("floa-user-email", "\"a@floa.shop\"").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("favorites").unwrap(), None);
        assert_eq!(reopened.get("floa-cart").unwrap().as_deref(), Some("[]"));
    }
}
