// File: deckhand-sync/src/store.rs
// Purpose: Durable, ordered queue of uploads not yet confirmed remotely

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::models::{PendingUpload, SyncSnapshot, SyncState, SyncStatus, UploadId, UploadKind};
use crate::storage::KeyValueStorage;

/// Storage key holding the serialized queue
pub const QUEUE_KEY: &str = "pending_uploads";

/// Owns the [`SyncState`] and publishes a [`SyncSnapshot`] after every mutation.
///
/// In-memory state is authoritative. Each mutation rewrites the whole queue to
/// the backing storage; a failed write is logged and repaired by the next one.
pub struct PendingUploadStore {
    state: Mutex<SyncState>,
    storage: Arc<dyn KeyValueStorage>,
    persist_lock: tokio::sync::Mutex<()>,
    max_retries: u32,
    snapshot_tx: watch::Sender<SyncSnapshot>,
}

impl PendingUploadStore {
    /// Open the store, loading any queue persisted by a previous run
    pub async fn open(
        storage: Arc<dyn KeyValueStorage>,
        max_retries: u32,
    ) -> Result<Self, SyncError> {
        let pending_uploads: Vec<PendingUpload> =
            match storage.get(QUEUE_KEY).await.map_err(SyncError::Persistence)? {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Vec::new(),
            };

        let mut state = SyncState {
            pending_uploads,
            ..SyncState::default()
        };
        state.sync_status = resting_status(&state, max_retries, 0);

        info!(
            backend = storage.name(),
            pending = state.pending_count(),
            status = %state.sync_status,
            "Loaded pending upload queue"
        );

        let (snapshot_tx, _) = watch::channel(SyncSnapshot::from_state(&state, max_retries));

        Ok(Self {
            state: Mutex::new(state),
            storage,
            persist_lock: tokio::sync::Mutex::new(()),
            max_retries,
            snapshot_tx,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn storage_name(&self) -> &'static str {
        self.storage.name()
    }

    /// Current aggregate view
    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribe to aggregate state changes
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.lock().sync_status
    }

    pub fn is_online(&self) -> bool {
        self.lock().is_online
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending_count()
    }

    /// Queue contents in processing order
    pub fn pending_uploads(&self) -> Vec<PendingUpload> {
        self.lock().pending_uploads.clone()
    }

    pub fn get(&self, id: UploadId) -> Option<PendingUpload> {
        self.lock().find(id).cloned()
    }

    pub(crate) fn pending_ids(&self) -> Vec<UploadId> {
        self.lock().pending_uploads.iter().map(|upload| upload.id).collect()
    }

    /// True when any of `ids` is still queued with retry budget left
    pub(crate) fn any_attemptable(&self, ids: &[UploadId]) -> bool {
        let state = self.lock();
        ids.iter().any(|id| {
            state
                .find(*id)
                .is_some_and(|upload| !upload.is_exhausted(self.max_retries))
        })
    }

    /// Append a new upload with a zero retry count
    pub async fn enqueue(
        &self,
        kind: UploadKind,
        payload: serde_json::Value,
        local_reference: Option<String>,
    ) -> UploadId {
        let upload = PendingUpload::new(kind, payload, local_reference);
        let id = upload.id;

        let pending = self.mutate(|state| {
            state.pending_uploads.push(upload);
            if state.sync_status == SyncStatus::Synced {
                state.sync_status = SyncStatus::Pending;
            }
            state.pending_count()
        });

        debug!(upload_id = %id, %kind, pending, "Queued upload");
        self.persist_or_warn().await;
        id
    }

    /// Delete an upload; an emptied queue counts as a completed sync
    pub async fn remove(&self, id: UploadId) -> Result<PendingUpload, SyncError> {
        let removed = self
            .mutate(|state| {
                let index = state.position(id)?;
                let removed = state.pending_uploads.remove(index);
                if state.pending_uploads.is_empty() {
                    mark_drained(state);
                }
                Some(removed)
            })
            .ok_or(SyncError::UnknownUpload(id))?;

        self.persist_or_warn().await;
        Ok(removed)
    }

    /// Count a failed attempt. Returns the new retry count.
    pub async fn record_failure(
        &self,
        id: UploadId,
        error: impl Into<String>,
    ) -> Result<u32, SyncError> {
        let error = error.into();
        let max_retries = self.max_retries;

        let retry_count = self
            .mutate(|state| {
                let upload = state.find_mut(id)?;
                upload.retry_count = upload.retry_count.saturating_add(1);
                upload.last_error = Some(error.clone());
                let retry_count = upload.retry_count;

                if retry_count >= max_retries {
                    state.sync_status = SyncStatus::Error;
                    state.sync_error = Some(format!(
                        "upload {} failed after {} attempts: {}",
                        id, retry_count, error
                    ));
                }
                Some(retry_count)
            })
            .ok_or(SyncError::UnknownUpload(id))?;

        if retry_count >= max_retries {
            warn!(upload_id = %id, retry_count, %error, "Upload exhausted its retry budget");
        } else {
            debug!(upload_id = %id, retry_count, %error, "Upload attempt failed");
        }

        self.persist_or_warn().await;
        Ok(retry_count)
    }

    /// Give an upload a fresh retry budget
    pub async fn reset_retry(&self, id: UploadId) -> Result<PendingUpload, SyncError> {
        let max_retries = self.max_retries;

        let upload = self
            .mutate(|state| {
                let upload = state.find_mut(id)?;
                upload.retry_count = 0;
                upload.last_error = None;
                let upload = upload.clone();

                if state.sync_status == SyncStatus::Error && state.exhausted_count(max_retries) == 0 {
                    state.sync_status = SyncStatus::Pending;
                    state.sync_error = None;
                }
                Some(upload)
            })
            .ok_or(SyncError::UnknownUpload(id))?;

        debug!(upload_id = %id, "Reset retry counter");
        self.persist_or_warn().await;
        Ok(upload)
    }

    /// Drop every queued upload. Returns how many were discarded.
    pub async fn clear(&self) -> usize {
        let discarded = self.mutate(|state| {
            let discarded = state.pending_uploads.len();
            state.pending_uploads.clear();
            state.sync_status = SyncStatus::Synced;
            state.sync_error = None;
            discarded
        });

        info!(discarded, "Cleared pending upload queue");
        self.persist_or_warn().await;
        discarded
    }

    /// Record the latest connectivity. Returns the previous value.
    pub fn set_online(&self, online: bool) -> bool {
        self.mutate(|state| std::mem::replace(&mut state.is_online, online))
    }

    pub(crate) fn begin_pass(&self) {
        self.mutate(|state| state.sync_status = SyncStatus::Syncing);
    }

    /// Recompute aggregate status once a pass (or manual retry) is over
    pub(crate) fn settle(&self, failures: usize) -> SyncStatus {
        let max_retries = self.max_retries;

        self.mutate(|state| {
            let status = resting_status(state, max_retries, failures);
            match status {
                SyncStatus::Synced => mark_drained(state),
                SyncStatus::Error if failures > 0 && state.exhausted_count(max_retries) == 0 => {
                    state.sync_error = Some(format!(
                        "{} upload(s) failed during sync, {} still pending",
                        failures,
                        state.pending_count()
                    ));
                }
                SyncStatus::Error => {
                    if state.sync_error.is_none() {
                        state.sync_error = Some(format!(
                            "{} upload(s) need a manual retry",
                            state.exhausted_count(max_retries)
                        ));
                    }
                }
                _ => {}
            }
            state.sync_status = status;
            status
        })
    }

    /// Write the queue to storage, surfacing any error.
    ///
    /// An empty queue deletes the stored key instead of writing `[]`.
    pub async fn flush(&self) -> Result<(), SyncError> {
        let _guard = self.persist_lock.lock().await;

        // Serialized under the persist lock so the last write carries the latest queue
        let raw = {
            let state = self.lock();
            if state.pending_uploads.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&state.pending_uploads)?)
            }
        };

        let written = match raw {
            Some(raw) => self.storage.set(QUEUE_KEY, raw).await,
            None => self.storage.delete(QUEUE_KEY).await,
        };
        written.map_err(SyncError::Persistence)
    }

    async fn persist_or_warn(&self) {
        if let Err(e) = self.flush().await {
            warn!(backend = self.storage.name(), error = %e, "Failed to persist pending uploads");
        }
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut SyncState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.lock();
            let result = f(&mut state);
            (result, SyncSnapshot::from_state(&state, self.max_retries))
        };

        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        result
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Status of a queue that is not being drained
fn resting_status(state: &SyncState, max_retries: u32, failures: usize) -> SyncStatus {
    if state.pending_uploads.is_empty() {
        SyncStatus::Synced
    } else if failures > 0 || state.exhausted_count(max_retries) > 0 {
        SyncStatus::Error
    } else {
        SyncStatus::Pending
    }
}

fn mark_drained(state: &mut SyncState) {
    state.sync_status = SyncStatus::Synced;
    state.sync_error = None;
    state.last_sync_at = Some(Utc::now());
}
