//! Object storage capability.

use async_trait::async_trait;

use crate::error::StorageError;

/// Handle to a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Key under which the object can be retrieved, relative to the store root.
    pub key: String,
}

/// Persists binary payloads under a caller-suggested path.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` and return the retrievable key.
    async fn store(&self, bytes: Vec<u8>, path: &str) -> Result<StoredObject, StorageError>;
}
