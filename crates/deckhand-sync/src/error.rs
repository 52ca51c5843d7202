// File: deckhand-sync/src/error.rs
// Purpose: Error types for the queue and its transports

use thiserror::Error;

use crate::models::UploadId;

/// Errors surfaced by the store and the engine
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("upload {0} is not queued")]
    UnknownUpload(UploadId),

    #[error("persistence error: {0:#}")]
    Persistence(anyhow::Error),

    #[error("failed to encode pending uploads: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sync engine has stopped")]
    EngineStopped,
}

/// Why a single transfer attempt failed
///
/// These never escape a drain pass; the message is recorded on the item.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("device is offline")]
    Offline,

    #[error("upload {0} has no local reference")]
    MissingLocalReference(UploadId),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("blob upload failed: {0}")]
    BlobUpload(String),

    #[error("document write failed: {0}")]
    DocumentWrite(String),
}
