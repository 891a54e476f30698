//! In-memory key-value store for testing.
//!
//! Provides a [`KeyValueStore`] that keeps entries in memory, suitable for
//! testing the session core without touching the file system.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{KeyValueStore, StorageError};

/// In-memory key-value store for testing.
///
/// Clones share the same entries, so a test can keep one handle for
/// inspection while the session owns another.
///
/// # Example
///
/// ```ignore
/// use aimeals::adapters::mock::InMemoryStorage;
/// use aimeals::traits::KeyValueStore;
///
/// let storage = InMemoryStorage::new();
/// storage.set_item("accessToken", "abc").await?;
/// assert_eq!(storage.item("accessToken"), Some("abc".to_string()));
///
/// storage.set_set_should_fail(true);
/// assert!(storage.set_item("accessToken", "def").await.is_err());
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStorage {
    /// Stored entries
    items: Arc<Mutex<HashMap<String, String>>>,
    /// Whether get_item should fail
    get_should_fail: Arc<Mutex<bool>>,
    /// Whether set_item should fail
    set_should_fail: Arc<Mutex<bool>>,
    /// Whether remove_item should fail
    remove_should_fail: Arc<Mutex<bool>>,
}

impl InMemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
            get_should_fail: Arc::new(Mutex::new(false)),
            set_should_fail: Arc::new(Mutex::new(false)),
            remove_should_fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Create a store seeded with entries.
    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let storage = Self::new();
        {
            let mut map = storage.items.lock().unwrap();
            for (key, value) in items {
                map.insert(key.into(), value.into());
            }
        }
        storage
    }

    /// Configure whether get_item should fail.
    pub fn set_get_should_fail(&self, should_fail: bool) {
        *self.get_should_fail.lock().unwrap() = should_fail;
    }

    /// Configure whether set_item should fail.
    pub fn set_set_should_fail(&self, should_fail: bool) {
        *self.set_should_fail.lock().unwrap() = should_fail;
    }

    /// Configure whether remove_item should fail.
    pub fn set_remove_should_fail(&self, should_fail: bool) {
        *self.remove_should_fail.lock().unwrap() = should_fail;
    }

    /// Read an entry synchronously (for assertions).
    pub fn item(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap().get(key).cloned()
    }

    /// Write an entry synchronously (for test setup).
    pub fn insert(&self, key: &str, value: &str) {
        self.items
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if *self.get_should_fail.lock().unwrap() {
            return Err(StorageError::LoadFailed("Mock load failure".to_string()));
        }
        Ok(self.item(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if *self.set_should_fail.lock().unwrap() {
            return Err(StorageError::SaveFailed("Mock save failure".to_string()));
        }
        self.insert(key, value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if *self.remove_should_fail.lock().unwrap() {
            return Err(StorageError::Other("Mock remove failure".to_string()));
        }
        self.items.lock().unwrap().remove(key);
        Ok(())
    }
}
