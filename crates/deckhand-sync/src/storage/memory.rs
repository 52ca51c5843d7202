//! In-memory storage backend

use crate::storage::KeyValueStorage;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage backend
///
/// Lost on restart. Clones share the same map, so a test can hand one clone
/// to a store and inspect what it wrote through another.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_basic() {
        let storage = MemoryStorage::new();

        storage.set("queue", "[]".to_string()).await.unwrap();
        assert_eq!(storage.get("queue").await.unwrap().as_deref(), Some("[]"));
        assert!(storage.get("other").await.unwrap().is_none());

        storage.delete("queue").await.unwrap();
        assert!(storage.get("queue").await.unwrap().is_none());

        // Missing keys delete cleanly
        storage.delete("queue").await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let storage = MemoryStorage::new();
        let observer = storage.clone();

        storage.set("a", "1".to_string()).await.unwrap();
        assert_eq!(observer.get("a").await.unwrap().as_deref(), Some("1"));

        observer.delete("a").await.unwrap();
        assert!(storage.get("a").await.unwrap().is_none());
    }
}
