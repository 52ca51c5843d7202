pub mod queue;
pub mod reconcile;
pub mod status;
pub mod summary;

use anyhow::{Context, Result};
use deckhand_sync::{storage, Config, PendingUploadStore, StorageBackend, SyncConfig};
use std::path::Path;
use tracing::{debug, warn};

/// Load deckhand.toml (or the file given with --config) into a runtime config
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    config.sync.to_runtime_config()
}

/// Open the persisted queue described by the config
pub async fn open_store(path: Option<&Path>) -> Result<PendingUploadStore> {
    let config = load_config(path)?;

    if config.storage == StorageBackend::Memory {
        warn!("Memory storage configured; the queue is always empty outside the app");
    }
    debug!(storage = ?config.storage, "Opening pending upload queue");

    let backend = storage::open(&config.storage)
        .await
        .context("Failed to open queue storage")?;

    PendingUploadStore::open(backend, config.max_retries)
        .await
        .context("Failed to load pending uploads")
}

/// Format a money amount with two decimals
pub fn money(value: f64) -> String {
    format!("{:.2}", value)
}
