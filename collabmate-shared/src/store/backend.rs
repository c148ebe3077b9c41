/// Storage backends for collection snapshots
///
/// A backend stores opaque snapshot bytes per collection name. Two
/// implementations are provided:
///
/// - [`JsonFileBackend`]: one `<collection>.json` file per collection under a
///   data directory
/// - [`MemoryBackend`]: a process-local map, for tests

use super::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Byte-level snapshot storage
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Reads the snapshot for `collection`, or `None` if it was never written
    async fn read(&self, collection: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the snapshot for `collection`
    async fn write(&self, collection: &str, bytes: Vec<u8>) -> Result<(), StoreError>;
}

/// File-per-collection backend
///
/// Snapshots live at `<dir>/<collection>.json`. Writes go through a sibling
/// temp file followed by a rename, so a crash mid-write cannot leave a torn
/// snapshot behind.
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Creates a backend rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.json", collection))
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    async fn read(&self, collection: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.path(collection)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(format!(
                "reading '{}': {}",
                collection, e
            ))),
        }
    }

    async fn write(&self, collection: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::Io(format!("creating data dir: {}", e)))?;

        let target = self.path(collection);
        let tmp = self.dir.join(format!("{}.json.tmp", collection));

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::Io(format!("writing '{}': {}", collection, e)))?;
        tokio::fs::rename(&tmp, &target)
            .await
            .map_err(|e| StoreError::Io(format!("committing '{}': {}", collection, e)))?;

        Ok(())
    }
}

/// In-memory backend for tests
#[derive(Default)]
pub struct MemoryBackend {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, collection: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.read().await.get(collection).cloned())
    }

    async fn write(&self, collection: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.data.write().await.insert(collection.to_string(), bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();

        assert!(backend.read("users").await.unwrap().is_none());

        backend.write("users", b"[]".to_vec()).await.unwrap();
        assert_eq!(backend.read("users").await.unwrap().unwrap(), b"[]");

        backend.write("users", b"[1]".to_vec()).await.unwrap();
        assert_eq!(backend.read("users").await.unwrap().unwrap(), b"[1]");
    }

    #[tokio::test]
    async fn test_memory_backend_collections_are_independent() {
        let backend = MemoryBackend::new();
        backend.write("users", b"[1]".to_vec()).await.unwrap();

        assert!(backend.read("tasks").await.unwrap().is_none());
    }
}
