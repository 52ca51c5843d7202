//! Filesystem storage backend

use crate::config::FilesystemConfig;
use crate::storage::KeyValueStorage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Filesystem storage backend
///
/// One JSON file per key inside the configured directory. Writes go to a
/// temporary file first and are renamed into place, so a crash mid-write
/// leaves the previous queue intact.
#[derive(Clone)]
pub struct FilesystemStorage {
    config: FilesystemConfig,
}

impl FilesystemStorage {
    /// Create the backend, creating its directory if needed
    pub async fn new(config: FilesystemConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)
            .await
            .with_context(|| format!("Failed to create queue directory {}", config.path.display()))?;

        Ok(Self { config })
    }

    /// Get the file path for a key
    fn key_to_path(&self, key: &str) -> PathBuf {
        let safe_key = key
            .replace('/', "_")
            .replace('\\', "_")
            .replace(':', "_");

        self.config.path.join(format!("{}.json", safe_key))
    }
}

#[async_trait]
impl KeyValueStorage for FilesystemStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_to_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Ok(Some(content))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.key_to_path(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, value)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;

        fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to move {} into place", tmp_path.display()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_to_path(key);

        if path.exists() {
            fs::remove_file(&path)
                .await
                .with_context(|| format!("Failed to delete {}", path.display()))?;
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
