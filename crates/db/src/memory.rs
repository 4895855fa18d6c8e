use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{ObjectStore, Record, StoreError};

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<String, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.objects.get(key).map(|r| r.value().clone()))
    }

    async fn write(
        &self,
        key: &str,
        value: &str,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        match self.objects.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let found = entry.get().version;
                if found != expected_version {
                    return Err(StoreError::VersionConflict {
                        key: key.to_string(),
                        expected: expected_version,
                        found,
                    });
                }
                let record = entry.get_mut();
                record.value = value.to_string();
                record.version = found + 1;
                Ok(record.version)
            }
            Entry::Vacant(entry) => {
                if expected_version != 0 {
                    return Err(StoreError::VersionConflict {
                        key: key.to_string(),
                        expected: expected_version,
                        found: 0,
                    });
                }
                entry.insert(Record {
                    key: key.to_string(),
                    value: value.to_string(),
                    version: 1,
                });
                Ok(1)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.objects.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|r| r.key().starts_with(prefix))
            .map(|r| r.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
