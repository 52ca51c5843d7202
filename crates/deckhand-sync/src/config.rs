//! Sync configuration types

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Attempts allowed per upload before it needs a manual retry
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Pause after a failed transfer before the next queued item
pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_secs(5);

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "deckhand.toml";

/// Runtime configuration for the sync engine
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Retry budget per upload
    pub max_retries: u32,

    /// Delay inserted after a non-final failure
    pub failure_delay: Duration,

    /// Where the queue is persisted
    pub storage: StorageBackend,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            failure_delay: DEFAULT_FAILURE_DELAY,
            storage: StorageBackend::Memory,
        }
    }
}

impl SyncConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_failure_delay(mut self, failure_delay: Duration) -> Self {
        self.failure_delay = failure_delay;
        self
    }

    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory storage (non-persistent, useful for tests)
    Memory,

    /// JSON files on disk (survives restarts)
    Filesystem(FilesystemConfig),
}

/// Filesystem storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemConfig {
    /// Directory holding the queue files
    pub path: PathBuf,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".deckhand/queue"),
        }
    }
}

/// Contents of deckhand.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncTomlConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load deckhand.toml from the working directory, or defaults when absent
    pub fn load_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// `[sync]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncTomlConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_failure_delay_secs")]
    pub failure_delay_secs: u64,

    #[serde(default)]
    pub storage: StorageTomlConfig,
}

impl Default for SyncTomlConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            failure_delay_secs: default_failure_delay_secs(),
            storage: StorageTomlConfig::default(),
        }
    }
}

/// `[sync.storage]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageTomlConfig {
    /// "memory" or "filesystem"
    #[serde(default = "default_primary")]
    pub primary: String,

    pub filesystem: Option<FilesystemConfig>,
}

impl Default for StorageTomlConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            filesystem: None,
        }
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_failure_delay_secs() -> u64 {
    DEFAULT_FAILURE_DELAY.as_secs()
}

fn default_primary() -> String {
    "filesystem".to_string()
}

impl SyncTomlConfig {
    /// Convert TOML config to runtime config
    pub fn to_runtime_config(&self) -> Result<SyncConfig> {
        if self.max_retries == 0 {
            anyhow::bail!("sync.max_retries must be at least 1");
        }

        let storage = match self.storage.primary.as_str() {
            "memory" => StorageBackend::Memory,
            "filesystem" => {
                StorageBackend::Filesystem(self.storage.filesystem.clone().unwrap_or_default())
            }
            other => anyhow::bail!("Unknown storage backend: {}", other),
        };

        Ok(SyncConfig {
            max_retries: self.max_retries,
            failure_delay: Duration::from_secs(self.failure_delay_secs),
            storage,
        })
    }
}
