//! In-memory object store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use query_core::{ObjectStore, StorageError, StoredObject};

/// An object store that keeps everything in a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write.
    pub fn failing() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_writes: true,
        }
    }

    /// Content stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn store(&self, bytes: Vec<u8>, path: &str) -> Result<StoredObject, StorageError> {
        if self.fail_writes {
            return Err(StorageError::Backend("writes disabled".to_string()));
        }
        self.lock().insert(path.to_string(), bytes);
        Ok(StoredObject {
            key: path.to_string(),
        })
    }
}
