//! In-memory [`ObjectStore`] for tests and local development.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{ObjectStore, StorageError, StoredObject};

/// Base URL used for public URLs of in-memory objects.
const MEMORY_BASE_URL: &str = "memory://store";

/// Object store holding everything in a process-local map.
///
/// Mirrors the S3 semantics the rest of the system relies on: overwriting
/// puts, idempotent deletes, prefix listing.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Stored>>,
}

struct Stored {
    bytes: Vec<u8>,
    #[allow(dead_code)]
    content_type: String,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects (test assertions).
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an object exists at `path` (test assertions).
    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }

    /// Stored bytes at `path`, if any (test assertions).
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).map(|s| s.bytes.clone())
    }

    fn public_url(path: &str) -> String {
        format!("{MEMORY_BASE_URL}/{path}")
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.objects.lock().unwrap().insert(
            path.to_string(),
            Stored {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(Self::public_url(path))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        // Removing a missing key is a no-op, matching S3.
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(|key| {
                let name = key.strip_prefix(prefix).unwrap_or(key);
                StoredObject {
                    name: name.trim_start_matches('/').to_string(),
                    public_url: Self::public_url(key),
                }
            })
            .filter(|o| !o.name.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_list_delete_round_trip() {
        let store = MemoryStore::new();
        let url = store
            .put("inputs/1/cat.png", b"bytes".to_vec(), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "memory://store/inputs/1/cat.png");

        let listed = store.list("inputs/1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "cat.png");

        store.delete("inputs/1/cat.png").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_of_missing_object_succeeds() {
        let store = MemoryStore::new();
        store.delete("never/created").await.unwrap();
    }
}
