//! Local object storage and the key layout for downloaded files.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use query_core::{ObjectStore, StorageError, StoredObject};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Filesystem-backed object store.
///
/// Keys are relative paths under `root`. The directory tree is created on
/// demand.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a key, if the key is a safe relative path.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let mut components = relative.components().peekable();
        if components.peek().is_none() {
            return Err(StorageError::InvalidPath(key.to_string()));
        }
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return Err(StorageError::InvalidPath(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn store(&self, bytes: Vec<u8>, path: &str) -> Result<StoredObject, StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &bytes).await?;

        debug!(key = path, size = bytes.len(), "Stored object");
        Ok(StoredObject {
            key: path.to_string(),
        })
    }
}

/// Split a command line into its name and parameter string.
///
/// `"/cla 12345678"` becomes `("/cla", "12345678")`.
pub fn split_command(command: &str) -> (&str, &str) {
    let command = command.trim();
    match command.split_once(char::is_whitespace) {
        Some((name, params)) => (name, params.trim()),
        None => (command, ""),
    }
}

/// Directory-safe slug for a command name.
///
/// The leading slash is dropped, the name is lowercased and anything outside
/// `[a-z0-9_]` becomes `_`.
pub fn command_slug(name: &str) -> String {
    let slug: String = name
        .trim_start_matches('/')
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .collect();

    if slug.is_empty() {
        "query".to_string()
    } else {
        slug
    }
}

/// SHA-256 fingerprint of a command, stable across runs.
pub fn cache_key(name: &str, params: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b":");
    hasher.update(params.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Storage path for a file produced by `command`: `<slug>/<cache key>/<file name>`.
pub fn storage_path(command: &str, file_name: &str) -> String {
    let (name, params) = split_command(command);
    format!(
        "{}/{}/{}",
        command_slug(name),
        cache_key(name, params),
        file_name
    )
}
