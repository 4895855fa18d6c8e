//! Key-prefixed object storage with optimistic versioning
//!
//! Objects are JSON documents stored under string keys such as
//! `/slice/{uuid}`. Every key carries a version counter: a write names the
//! version it expects to replace (0 for a new key) and fails with
//! [`StoreError::VersionConflict`] if someone else got there first.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("failed to encode or decode stored object: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("version conflict on {key}: expected {expected}, found {found}")]
    VersionConflict {
        key: String,
        expected: i64,
        found: i64,
    },
}

/// A raw stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
    pub version: i64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the record at `key`, if any
    async fn read(&self, key: &str) -> Result<Option<Record>, StoreError>;

    /// Write `value` at `key` if the stored version equals `expected_version`.
    /// Returns the new version.
    async fn write(&self, key: &str, value: &str, expected_version: i64)
    -> Result<i64, StoreError>;

    /// Delete `key`. Returns false when nothing was stored there.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Keys starting with `prefix`, sorted
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// A typed document that knows its own key and version
pub trait StoredObject: Serialize + DeserializeOwned + Send + Sync {
    fn key(&self) -> String;
    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
}

/// Write `obj`, bumping its version on success
pub async fn write_object<T: StoredObject>(
    store: &dyn ObjectStore,
    obj: &mut T,
) -> Result<(), StoreError> {
    let key = obj.key();
    let value = serde_json::to_string(obj)?;
    let version = store.write(&key, &value, obj.version()).await?;
    obj.set_version(version);
    tracing::debug!("stored {} at version {}", key, version);
    Ok(())
}

/// Read the object stored at `key`, with its version filled in
pub async fn read_object<T: StoredObject>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(record) = store.read(key).await? else {
        return Ok(None);
    };
    let mut obj: T = serde_json::from_str(&record.value)?;
    obj.set_version(record.version);
    Ok(Some(obj))
}

/// Read every object under `prefix`
pub async fn list_objects<T: StoredObject>(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for key in store.list_keys(prefix).await? {
        // a concurrent delete between list and read is not an error
        if let Some(obj) = read_object(store, &key).await? {
            out.push(obj);
        }
    }
    Ok(out)
}
