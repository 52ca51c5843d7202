// File: deckhand-sync/src/engine.rs
// Purpose: Wires store, network monitor and processor behind one event loop

use futures::Stream;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::models::{PendingUpload, SyncSnapshot, UploadId, UploadKind};
use crate::network::{DrainTrigger, NetworkMonitor, NetworkStatus, SyncEvent};
use crate::processor::{DrainOutcome, RetryOutcome, UploadProcessor};
use crate::storage::{self, KeyValueStorage};
use crate::store::PendingUploadStore;
use crate::transport::UploadTransport;

/// Main sync engine
///
/// Connectivity reports flow through an event channel into a background loop
/// that starts drain passes. The processor's drain slot drops triggers that
/// arrive while a pass is running.
pub struct SyncEngine {
    store: Arc<PendingUploadStore>,
    processor: Arc<UploadProcessor>,
    monitor: NetworkMonitor,
    events: mpsc::UnboundedSender<SyncEvent>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    /// Open the configured storage and start the engine
    pub async fn start(
        config: SyncConfig,
        transport: Arc<dyn UploadTransport>,
        initial_online: bool,
    ) -> Result<Self, SyncError> {
        let storage = storage::open(&config.storage)
            .await
            .map_err(SyncError::Persistence)?;

        Self::with_storage(config, storage, transport, initial_online).await
    }

    /// Start the engine on an already-open storage backend
    pub async fn with_storage(
        config: SyncConfig,
        storage: Arc<dyn KeyValueStorage>,
        transport: Arc<dyn UploadTransport>,
        initial_online: bool,
    ) -> Result<Self, SyncError> {
        let store = Arc::new(PendingUploadStore::open(storage, config.max_retries).await?);
        store.set_online(initial_online);

        let processor = Arc::new(UploadProcessor::new(store.clone(), transport, &config));
        let (events, events_rx) = mpsc::unbounded_channel();
        let monitor = NetworkMonitor::new(store.clone(), events.clone());

        let worker = tokio::spawn(run_event_loop(processor.clone(), events_rx));

        if initial_online && store.pending_count() > 0 {
            events
                .send(SyncEvent::Drain(DrainTrigger::Startup))
                .map_err(|_| SyncError::EngineStopped)?;
        }

        info!(
            online = initial_online,
            pending = store.pending_count(),
            max_retries = config.max_retries,
            "Sync engine started"
        );

        Ok(Self {
            store,
            processor,
            monitor,
            events,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Queue an upload for eventual delivery
    pub async fn enqueue(
        &self,
        kind: UploadKind,
        payload: serde_json::Value,
        local_reference: Option<String>,
    ) -> UploadId {
        self.store.enqueue(kind, payload, local_reference).await
    }

    /// Run a drain pass now and wait for it
    pub async fn process_pending_uploads(&self) -> DrainOutcome {
        self.processor.process_pending_uploads().await
    }

    pub async fn retry_failed_upload(&self, id: UploadId) -> Result<RetryOutcome, SyncError> {
        self.processor.retry_failed_upload(id).await
    }

    /// Discard every queued upload (e.g. on sign-out)
    pub async fn clear(&self) -> usize {
        self.store.clear().await
    }

    /// Report connectivity. Returns true when a drain was triggered.
    pub fn set_online(&self, online: bool) -> bool {
        self.monitor.report(NetworkStatus::from(online))
    }

    /// Follow a platform connectivity stream in the background
    pub fn watch_connectivity<S>(&self, stream: S) -> JoinHandle<()>
    where
        S: Stream<Item = NetworkStatus> + Send + Unpin + 'static,
    {
        let monitor = self.monitor.clone();
        tokio::spawn(async move { monitor.follow(stream).await })
    }

    pub fn is_online(&self) -> bool {
        self.store.is_online()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.store.subscribe()
    }

    pub fn pending_uploads(&self) -> Vec<PendingUpload> {
        self.store.pending_uploads()
    }

    pub fn store(&self) -> &Arc<PendingUploadStore> {
        &self.store
    }

    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    /// Stop the event loop. Passes already running finish on their own.
    pub async fn shutdown(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(worker) = worker else {
            return;
        };

        if self.events.send(SyncEvent::Shutdown).is_err() {
            debug!("Event loop already gone");
        }
        if let Err(e) = worker.await {
            warn!(error = %e, "Sync event loop ended abnormally");
        }
        info!("Sync engine stopped");
    }
}

async fn run_event_loop(
    processor: Arc<UploadProcessor>,
    mut events: mpsc::UnboundedReceiver<SyncEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            SyncEvent::Drain(trigger) => {
                let processor = processor.clone();
                // Spawned so a trigger arriving mid-pass reaches the drain slot and is dropped
                tokio::spawn(async move {
                    let outcome = processor.process_pending_uploads().await;
                    debug!(?trigger, ?outcome, "Triggered drain finished");
                });
            }
            SyncEvent::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use crate::models::SyncStatus;
    use crate::storage::MemoryStorage;
    use crate::transport::TransferReceipt;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    struct AlwaysOk;

    #[async_trait]
    impl UploadTransport for AlwaysOk {
        async fn transfer(&self, _upload: &PendingUpload) -> Result<TransferReceipt, TransferError> {
            Ok(TransferReceipt::default())
        }
    }

    fn config() -> SyncConfig {
        SyncConfig::default().with_failure_delay(Duration::ZERO)
    }

    async fn wait_for_status(engine: &SyncEngine, status: SyncStatus) {
        let mut rx = engine.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.sync_status == status))
            .await
            .expect("timed out waiting for status")
            .unwrap();
    }

    #[tokio::test]
    async fn test_reconnect_drains_in_background() {
        let engine = SyncEngine::start(config(), Arc::new(AlwaysOk), false).await.unwrap();
        engine
            .enqueue(UploadKind::StructuredData, json!({ "collection": "advances" }), None)
            .await;
        assert_eq!(engine.snapshot().sync_status, SyncStatus::Pending);

        assert!(engine.set_online(true));
        wait_for_status(&engine, SyncStatus::Synced).await;

        assert_eq!(engine.snapshot().pending_count, 0);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_startup_online_flushes_persisted_queue() {
        let storage = MemoryStorage::new();
        {
            let engine = SyncEngine::with_storage(config(), Arc::new(storage.clone()), Arc::new(AlwaysOk), false)
                .await
                .unwrap();
            engine.enqueue(UploadKind::StructuredData, json!({}), None).await;
            engine.shutdown().await;
        }

        let engine = SyncEngine::with_storage(config(), Arc::new(storage), Arc::new(AlwaysOk), true)
            .await
            .unwrap();
        wait_for_status(&engine, SyncStatus::Synced).await;
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_offline_enqueue_stays_pending() {
        let engine = SyncEngine::start(config(), Arc::new(AlwaysOk), false).await.unwrap();
        engine.enqueue(UploadKind::StructuredData, json!({}), None).await;

        assert_eq!(engine.process_pending_uploads().await, DrainOutcome::Offline);
        assert_eq!(engine.pending_uploads().len(), 1);
        assert!(!engine.is_online());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let engine = SyncEngine::start(config(), Arc::new(AlwaysOk), true).await.unwrap();
        engine.shutdown().await;
        engine.shutdown().await;
    }
}
