//! Artifact store gateway.
//!
//! Generated outputs and user-supplied inputs live in object storage
//! behind public URLs. [`ObjectStore`] is the boundary trait; the S3
//! implementation backs production and [`MemoryStore`] backs tests and
//! local development.
//!
//! Deletion is idempotent by contract: deleting an object that is
//! already gone succeeds.

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};

use async_trait::async_trait;

/// One stored object as returned by [`ObjectStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// File name relative to the listed prefix.
    pub name: String,
    /// Public URL of the object.
    pub public_url: String,
}

/// Errors from the storage boundary.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Upload failed.
    #[error("Upload failed for '{path}': {message}")]
    Upload { path: String, message: String },

    /// Delete failed for a reason other than the object being absent.
    #[error("Delete failed for '{path}': {message}")]
    Delete { path: String, message: String },

    /// Listing failed.
    #[error("List failed for prefix '{prefix}': {message}")]
    List { prefix: String, message: String },
}

/// Boundary trait for object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `bytes` under `path` and return the object's public URL.
    /// Overwrites any existing object at the same path.
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Delete the object at `path`. Succeeds when the object is already
    /// gone.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// List objects under `prefix`, with names relative to the prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError>;
}
