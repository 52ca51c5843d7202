//! Durable key-value backends for the pending-upload queue

use crate::config::StorageBackend;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod filesystem;
pub mod memory;

pub use filesystem::FilesystemStorage;
pub use memory::MemoryStorage;

/// Trait for queue persistence backends
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Get a stored value by key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Get storage backend name
    fn name(&self) -> &'static str;
}

/// Create a storage backend from config
pub async fn open(backend: &StorageBackend) -> Result<Arc<dyn KeyValueStorage>> {
    match backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageBackend::Filesystem(config) => {
            let storage = FilesystemStorage::new(config.clone()).await?;
            Ok(Arc::new(storage))
        }
    }
}
