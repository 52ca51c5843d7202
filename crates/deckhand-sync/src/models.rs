// File: deckhand-sync/src/models.rs
// Purpose: Queue records and aggregate sync state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a queued upload, generated at enqueue time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(Uuid);

impl UploadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UploadId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What a pending upload carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadKind {
    /// Binary receipt photo held on the device
    ReceiptImage,
    /// A document destined for the remote database
    StructuredData,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::ReceiptImage => "receipt-image",
            UploadKind::StructuredData => "structured-data",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "receipt-image" => Ok(UploadKind::ReceiptImage),
            "structured-data" => Ok(UploadKind::StructuredData),
            other => Err(format!("unknown upload kind: {}", other)),
        }
    }
}

/// A unit of work waiting for network persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpload {
    pub id: UploadId,

    #[serde(rename = "type")]
    pub kind: UploadKind,

    /// Device-local handle (file path) for binary content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_reference: Option<String>,

    /// Identifiers and fields of the logical record being synced
    pub payload: serde_json::Value,

    #[serde(default)]
    pub retry_count: u32,

    #[serde(default)]
    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl PendingUpload {
    pub fn new(
        kind: UploadKind,
        payload: serde_json::Value,
        local_reference: Option<String>,
    ) -> Self {
        Self {
            id: UploadId::new(),
            kind,
            local_reference,
            payload,
            retry_count: 0,
            last_error: None,
            created_at: Utc::now(),
        }
    }

    /// True once the item has used up its attempts and needs a manual retry
    pub fn is_exhausted(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries
    }
}

/// Aggregate queue status shown to the crew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Synced,
    Pending,
    Syncing,
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::Pending => write!(f, "pending"),
            SyncStatus::Syncing => write!(f, "syncing"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}

/// Process-wide sync state. Only `pending_uploads` survives a restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncState {
    pub is_online: bool,
    pub sync_status: SyncStatus,
    pub pending_uploads: Vec<PendingUpload>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub sync_error: Option<String>,
}

impl SyncState {
    pub fn pending_count(&self) -> usize {
        self.pending_uploads.len()
    }

    pub fn position(&self, id: UploadId) -> Option<usize> {
        self.pending_uploads.iter().position(|upload| upload.id == id)
    }

    pub fn find(&self, id: UploadId) -> Option<&PendingUpload> {
        self.pending_uploads.iter().find(|upload| upload.id == id)
    }

    pub fn find_mut(&mut self, id: UploadId) -> Option<&mut PendingUpload> {
        self.pending_uploads.iter_mut().find(|upload| upload.id == id)
    }

    pub fn exhausted_count(&self, max_retries: u32) -> usize {
        self.pending_uploads
            .iter()
            .filter(|upload| upload.is_exhausted(max_retries))
            .count()
    }
}

/// Read-only view of [`SyncState`] published to subscribers
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SyncSnapshot {
    pub is_online: bool,
    pub sync_status: SyncStatus,
    pub pending_count: usize,
    /// Items that used up their retry budget
    pub exhausted_count: usize,
    pub sync_error: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl SyncSnapshot {
    pub fn from_state(state: &SyncState, max_retries: u32) -> Self {
        Self {
            is_online: state.is_online,
            sync_status: state.sync_status,
            pending_count: state.pending_count(),
            exhausted_count: state.exhausted_count(max_retries),
            sync_error: state.sync_error.clone(),
            last_sync_at: state.last_sync_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pending_upload_serializes_type_tag() {
        let upload = PendingUpload::new(
            UploadKind::ReceiptImage,
            json!({ "expense_id": "ex-1" }),
            Some("/tmp/receipt.jpg".to_string()),
        );

        let value = serde_json::to_value(&upload).unwrap();
        assert_eq!(value["type"], "receipt-image");
        assert_eq!(value["retry_count"], 0);
        assert_eq!(value["local_reference"], "/tmp/receipt.jpg");
    }

    #[test]
    fn test_upload_id_parses_from_display() {
        let id = UploadId::new();
        let parsed: UploadId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<UploadId>().is_err());
    }

    #[test]
    fn test_exhausted_at_budget() {
        let mut upload = PendingUpload::new(UploadKind::StructuredData, json!({}), None);
        upload.retry_count = 2;
        assert!(!upload.is_exhausted(3));
        upload.retry_count = 3;
        assert!(upload.is_exhausted(3));
    }

    #[test]
    fn test_upload_kind_from_str() {
        assert_eq!("structured-data".parse::<UploadKind>().unwrap(), UploadKind::StructuredData);
        assert!("video".parse::<UploadKind>().is_err());
    }
}
