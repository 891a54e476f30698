//! File-backed key-value store.
//!
//! All entries live in one pretty-printed JSON object at
//! `~/.aimeals/storage.json` (or under a configured data directory), so a
//! session survives process restarts the way browser storage survives a
//! page reload.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use crate::traits::{KeyValueStore, StorageError};

/// The data directory name under the home directory.
pub const DATA_DIR: &str = ".aimeals";

/// The storage file name.
pub const STORAGE_FILE: &str = "storage.json";

type Entries = BTreeMap<String, String>;

/// JSON-file key-value store.
///
/// Reads and writes are serialized through an internal lock so concurrent
/// `set_item` calls from one process never interleave partial writes.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Create a store at `~/.aimeals/storage.json`.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self::in_dir(home.join(DATA_DIR)))
    }

    /// Create a store whose file lives in `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::with_path(dir.as_ref().join(STORAGE_FILE))
    }

    /// Create a store at an explicit file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Get the path to the storage file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries. A missing file is empty; an unreadable one is
    /// treated as empty and overwritten by the next write.
    fn read_entries(&self) -> Result<Entries, StorageError> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let file = File::open(&self.path).map_err(|e| StorageError::LoadFailed(e.to_string()))?;
        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt storage file");
                Ok(Entries::new())
            }
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file =
            File::create(&self.path).map_err(|e| StorageError::SaveFailed(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Entries) -> bool,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::Other("storage lock poisoned".to_string()))?;
        let mut entries = self.read_entries()?;
        if f(&mut entries) {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::Other("storage lock poisoned".to_string()))?;
        Ok(self.read_entries()?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}
