//! # deckhand-sync
//!
//! Offline-first data core for charter crews: a durable queue of uploads that
//! could not reach the backend, drained when connectivity returns, plus the
//! APA arithmetic used to reconcile cash at the end of a booking.
//!
//! ## Features
//!
//! - **Pending-upload store**: ordered, persisted queue with retry counters
//! - **Network monitor**: edge-triggered drain on offline → online
//! - **Upload processor**: one sequential drain pass at a time, bounded retries
//! - **Reconciliation**: expected vs. counted cash with a 0.01 tolerance
//!
//! ## Example
//!
//! ```rust,ignore
//! use deckhand_sync::{SyncConfig, SyncEngine, UploadKind};
//! use serde_json::json;
//!
//! let engine = SyncEngine::start(SyncConfig::default(), transport, false).await?;
//!
//! // Queue a receipt while offline
//! engine
//!     .enqueue(
//!         UploadKind::ReceiptImage,
//!         json!({ "booking_id": "bk-12", "expense_id": "ex-7" }),
//!         Some("/data/receipts/ex-7.jpg".to_string()),
//!     )
//!     .await;
//!
//! // Back online: the queue drains in the background
//! engine.set_online(true);
//! ```

pub mod apa;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod models;
pub mod network;
pub mod processor;
pub mod reconciliation;
pub mod storage;
pub mod store;
pub mod transport;

// Re-export main types
pub use apa::{ApaSummary, CategoryTotal};
pub use config::{Config, StorageBackend, SyncConfig};
pub use engine::SyncEngine;
pub use error::{SyncError, TransferError};
pub use ledger::{Advance, Amount, AmountError, Expense, ExpenseCategory, Ledger};
pub use models::{PendingUpload, SyncSnapshot, SyncState, SyncStatus, UploadId, UploadKind};
pub use network::{DrainTrigger, NetworkMonitor, NetworkStatus, SyncEvent};
pub use processor::{DrainOutcome, DrainReport, DrainState, RetryOutcome, UploadProcessor};
pub use reconciliation::{reconcile, ReconciliationInput, ReconciliationLabel, ReconciliationResult};
pub use storage::KeyValueStorage;
pub use store::PendingUploadStore;
pub use transport::{BlobStorage, DelegatingTransport, DocumentStore, TransferReceipt, UploadTransport};
