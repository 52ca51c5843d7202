// File: deckhand-sync/src/network.rs
// Purpose: Track connectivity and trigger a drain when the device comes back online

use futures::Stream;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::store::PendingUploadStore;

/// Connectivity as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

impl NetworkStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, NetworkStatus::Online)
    }
}

impl From<bool> for NetworkStatus {
    fn from(online: bool) -> Self {
        if online {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        }
    }
}

/// Why a drain pass was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainTrigger {
    /// Offline → online transition with work queued
    Reconnected,
    /// Engine started online with a persisted queue
    Startup,
}

/// Messages consumed by the engine's event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    Drain(DrainTrigger),
    Shutdown,
}

/// Edge-triggered connectivity monitor
///
/// Only an offline → online transition with a non-empty queue emits
/// [`SyncEvent::Drain`]. Repeated online reports are ignored.
#[derive(Clone)]
pub struct NetworkMonitor {
    store: Arc<PendingUploadStore>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl NetworkMonitor {
    pub fn new(store: Arc<PendingUploadStore>, events: mpsc::UnboundedSender<SyncEvent>) -> Self {
        Self { store, events }
    }

    pub fn is_online(&self) -> bool {
        self.store.is_online()
    }

    pub fn current_status(&self) -> NetworkStatus {
        NetworkStatus::from(self.is_online())
    }

    /// Record a connectivity report. Returns true when a drain was requested.
    pub fn report(&self, status: NetworkStatus) -> bool {
        let online = status.is_online();
        let was_online = self.store.set_online(online);

        match (was_online, online) {
            (false, true) => {
                let pending = self.store.pending_count();
                info!(pending, "Network: online");

                if pending == 0 {
                    return false;
                }

                if self.events.send(SyncEvent::Drain(DrainTrigger::Reconnected)).is_err() {
                    warn!("Sync engine stopped, dropping reconnect trigger");
                    return false;
                }
                true
            }
            (true, false) => {
                warn!("Network: offline");
                false
            }
            _ => {
                debug!(online, "Network status unchanged");
                false
            }
        }
    }

    /// Feed every status from a platform stream into [`report`](Self::report)
    pub async fn follow<S>(&self, stream: S)
    where
        S: Stream<Item = NetworkStatus> + Unpin,
    {
        let mut stream = stream;
        while let Some(status) = stream.next().await {
            self.report(status);
        }
        debug!("Connectivity stream ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadKind;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    async fn monitor() -> (NetworkMonitor, Arc<PendingUploadStore>, mpsc::UnboundedReceiver<SyncEvent>) {
        let store = Arc::new(
            PendingUploadStore::open(Arc::new(MemoryStorage::new()), 3)
                .await
                .unwrap(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        (NetworkMonitor::new(store.clone(), tx), store, rx)
    }

    #[tokio::test]
    async fn test_reconnect_with_queue_triggers_drain() {
        let (monitor, store, mut rx) = monitor().await;
        store.enqueue(UploadKind::StructuredData, json!({}), None).await;

        assert!(monitor.report(NetworkStatus::Online));
        assert_eq!(rx.try_recv().unwrap(), SyncEvent::Drain(DrainTrigger::Reconnected));
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn test_repeated_online_is_edge_triggered() {
        let (monitor, store, mut rx) = monitor().await;
        store.enqueue(UploadKind::StructuredData, json!({}), None).await;

        assert!(monitor.report(NetworkStatus::Online));
        assert!(!monitor.report(NetworkStatus::Online));
        assert!(!monitor.report(NetworkStatus::Online));

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reconnect_with_empty_queue_is_quiet() {
        let (monitor, _store, mut rx) = monitor().await;

        assert!(!monitor.report(NetworkStatus::Online));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_flap_triggers_again() {
        let (monitor, store, mut rx) = monitor().await;
        store.enqueue(UploadKind::StructuredData, json!({}), None).await;

        monitor.report(NetworkStatus::Online);
        monitor.report(NetworkStatus::Offline);
        assert_eq!(monitor.current_status(), NetworkStatus::Offline);
        monitor.report(NetworkStatus::Online);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_follow_stream() {
        let (monitor, store, mut rx) = monitor().await;
        store.enqueue(UploadKind::StructuredData, json!({}), None).await;

        let statuses = tokio_stream::iter(vec![
            NetworkStatus::Offline,
            NetworkStatus::Online,
            NetworkStatus::Online,
        ]);
        monitor.follow(statuses).await;

        assert_eq!(rx.try_recv().unwrap(), SyncEvent::Drain(DrainTrigger::Reconnected));
        assert!(rx.try_recv().is_err());
    }
}
