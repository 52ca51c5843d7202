// File: deckhand-sync/src/processor.rs
// Purpose: Sequential drain passes over the pending-upload queue

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::models::{PendingUpload, SyncStatus, UploadId};
use crate::store::PendingUploadStore;
use crate::transport::UploadTransport;

/// Whether a drain pass is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainState {
    #[default]
    Idle,
    Draining,
}

/// The drain slot plus manual retries that arrived while it was taken
#[derive(Debug, Default)]
struct DrainSlot {
    state: DrainState,
    deferred: Vec<UploadId>,
}

/// Proof that the holder owns the single drain slot; releases it on drop
struct DrainPermit<'a> {
    slot: &'a Mutex<DrainSlot>,
    released: bool,
}

impl<'a> DrainPermit<'a> {
    fn lock(&self) -> MutexGuard<'a, DrainSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retries handed to this holder since the last call
    fn take_deferred(&self) -> Vec<UploadId> {
        std::mem::take(&mut self.lock().deferred)
    }

    /// The pass reached this item itself, so no extra attempt is owed
    fn undefer(&self, id: UploadId) {
        self.lock().deferred.retain(|deferred| *deferred != id);
    }

    /// Give the slot back unless another retry was deferred meanwhile
    fn release_if_settled(&mut self) -> bool {
        let mut slot = self.lock();
        if !slot.deferred.is_empty() {
            return false;
        }
        slot.state = DrainState::Idle;
        self.released = true;
        true
    }
}

impl Drop for DrainPermit<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.lock().state = DrainState::Idle;
        }
    }
}

/// Counters for one completed pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub attempted: usize,
    pub uploaded: usize,
    pub failed: usize,
    /// Items left alone because their retry budget is used up
    pub skipped: usize,
    pub status: SyncStatus,
}

impl DrainReport {
    fn new() -> Self {
        Self {
            attempted: 0,
            uploaded: 0,
            failed: 0,
            skipped: 0,
            status: SyncStatus::Syncing,
        }
    }

    fn record(&mut self, attempt: &Attempt) {
        self.attempted += 1;
        match attempt {
            Attempt::Delivered => self.uploaded += 1,
            Attempt::Failed { .. } => self.failed += 1,
        }
    }
}

/// What a call to [`UploadProcessor::process_pending_uploads`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed(DrainReport),
    /// Another pass holds the drain slot; this trigger was dropped
    AlreadyRunning,
    Offline,
    Empty,
}

/// What a manual retry did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Uploaded,
    Failed { retry_count: u32, error: String },
    /// Counter reset only. Offline, the item waits for the next drain pass;
    /// during a pass, the running pass attempts it before it finishes.
    Queued,
}

/// Result of one transfer attempt on a queued item
enum Attempt {
    Delivered,
    Failed { retry_count: u32, error: String },
}

/// Drains the queue one item at a time through an [`UploadTransport`]
pub struct UploadProcessor {
    store: Arc<PendingUploadStore>,
    transport: Arc<dyn UploadTransport>,
    failure_delay: Duration,
    slot: Mutex<DrainSlot>,
}

impl UploadProcessor {
    pub fn new(
        store: Arc<PendingUploadStore>,
        transport: Arc<dyn UploadTransport>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            store,
            transport,
            failure_delay: config.failure_delay,
            slot: Mutex::new(DrainSlot::default()),
        }
    }

    pub fn state(&self) -> DrainState {
        self.lock_slot().state
    }

    pub fn store(&self) -> &Arc<PendingUploadStore> {
        &self.store
    }

    /// Take the drain slot. With `defer`, a taken slot records the id for its holder.
    fn try_begin(&self, defer: Option<UploadId>) -> Option<DrainPermit<'_>> {
        let mut slot = self.lock_slot();
        match slot.state {
            DrainState::Draining => {
                if let Some(id) = defer {
                    if !slot.deferred.contains(&id) {
                        slot.deferred.push(id);
                    }
                }
                None
            }
            DrainState::Idle => {
                slot.state = DrainState::Draining;
                Some(DrainPermit {
                    slot: &self.slot,
                    released: false,
                })
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, DrainSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one drain pass over the queue in FIFO order.
    ///
    /// Item failures are recorded on the item and never returned as errors.
    #[instrument(skip(self), level = "debug")]
    pub async fn process_pending_uploads(&self) -> DrainOutcome {
        let Some(mut permit) = self.try_begin(None) else {
            debug!("Drain already in flight, ignoring trigger");
            return DrainOutcome::AlreadyRunning;
        };

        if !self.store.is_online() {
            debug!("Offline, skipping drain");
            return DrainOutcome::Offline;
        }

        let queued = self.store.pending_ids();
        if queued.is_empty() {
            return DrainOutcome::Empty;
        }

        info!(pending = queued.len(), "Draining pending uploads");
        self.store.begin_pass();

        let max_retries = self.store.max_retries();
        let mut report = DrainReport::new();

        for (index, id) in queued.iter().copied().enumerate() {
            // Re-read: the item may have been cleared or reset since the pass began
            let Some(upload) = self.store.get(id) else {
                continue;
            };

            if upload.is_exhausted(max_retries) {
                report.skipped += 1;
                continue;
            }

            permit.undefer(id);
            let attempt = match self.attempt(&upload).await {
                Ok(attempt) => attempt,
                // Cleared while in flight
                Err(_) => continue,
            };
            report.record(&attempt);

            if let Attempt::Failed { retry_count, .. } = attempt {
                let rest = &queued[index + 1..];
                if retry_count < max_retries
                    && !self.failure_delay.is_zero()
                    && self.store.any_attemptable(rest)
                {
                    debug!(delay = ?self.failure_delay, "Pausing before next upload");
                    tokio::time::sleep(self.failure_delay).await;
                }
            }
        }

        self.finish(&mut permit, &mut report).await;
        info!(
            uploaded = report.uploaded,
            failed = report.failed,
            skipped = report.skipped,
            status = %report.status,
            "Drain pass finished"
        );

        DrainOutcome::Completed(report)
    }

    /// Reset an item's retry budget and, when online, attempt it right away.
    pub async fn retry_failed_upload(&self, id: UploadId) -> Result<RetryOutcome, SyncError> {
        let upload = self.store.reset_retry(id).await?;

        if !self.store.is_online() {
            debug!(upload_id = %id, "Offline, retry deferred to next drain");
            return Ok(RetryOutcome::Queued);
        }

        let Some(mut permit) = self.try_begin(Some(id)) else {
            debug!(upload_id = %id, "Drain in flight, retry handed to the running pass");
            return Ok(RetryOutcome::Queued);
        };

        self.store.begin_pass();
        let mut report = DrainReport::new();
        let attempt = self.attempt(&upload).await;
        if let Ok(attempt) = &attempt {
            report.record(attempt);
        }
        self.finish(&mut permit, &mut report).await;

        match attempt? {
            Attempt::Delivered => {
                info!(upload_id = %id, "Manual retry delivered upload");
                Ok(RetryOutcome::Uploaded)
            }
            Attempt::Failed { retry_count, error } => {
                warn!(upload_id = %id, %error, "Manual retry failed");
                Ok(RetryOutcome::Failed { retry_count, error })
            }
        }
    }

    /// Attempt retries deferred while the slot was held, then settle and release it
    async fn finish(&self, permit: &mut DrainPermit<'_>, report: &mut DrainReport) {
        let max_retries = self.store.max_retries();

        loop {
            for id in permit.take_deferred() {
                let Some(upload) = self.store.get(id) else {
                    continue;
                };
                if upload.is_exhausted(max_retries) {
                    continue;
                }

                debug!(upload_id = %id, "Attempting deferred manual retry");
                if let Ok(attempt) = self.attempt(&upload).await {
                    report.record(&attempt);
                }
            }

            report.status = self.store.settle(report.failed);
            if permit.release_if_settled() {
                break;
            }
        }
    }

    /// One transfer. Success removes the item; failure is recorded on it.
    async fn attempt(&self, upload: &PendingUpload) -> Result<Attempt, SyncError> {
        match self.transport.transfer(upload).await {
            Ok(receipt) => {
                self.store.remove(upload.id).await?;
                info!(
                    upload_id = %upload.id,
                    kind = %upload.kind,
                    remote_url = ?receipt.remote_url,
                    "Upload delivered"
                );
                Ok(Attempt::Delivered)
            }
            Err(err) => {
                let error = err.to_string();
                warn!(upload_id = %upload.id, kind = %upload.kind, %error, "Upload failed");
                let retry_count = self.store.record_failure(upload.id, error.clone()).await?;
                Ok(Attempt::Failed { retry_count, error })
            }
        }
    }
}
