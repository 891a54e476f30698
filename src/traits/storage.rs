//! Persisted key-value storage trait abstraction.
//!
//! The session core persists its credential record and two legacy token
//! entries through [`KeyValueStore`], the way a browser client would use
//! `localStorage`. Production code uses a JSON file; tests use an in-memory
//! map.

use async_trait::async_trait;

/// Storage operation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Failed to read the backing store
    LoadFailed(String),
    /// Failed to write the backing store
    SaveFailed(String),
    /// IO error
    Io(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::LoadFailed(msg) => write!(f, "Failed to load storage: {}", msg),
            StorageError::SaveFailed(msg) => write!(f, "Failed to save storage: {}", msg),
            StorageError::Io(msg) => write!(f, "IO error: {}", msg),
            StorageError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

/// Trait for string-keyed persisted storage.
///
/// # Example
///
/// ```ignore
/// use aimeals::traits::KeyValueStore;
///
/// async fn remember<S: KeyValueStore>(store: &S) -> Result<(), StorageError> {
///     store.set_item("accessToken", "eyJ...").await?;
///     assert!(store.get_item("accessToken").await?.is_some());
///     store.remove_item("accessToken").await
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key succeeds.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
