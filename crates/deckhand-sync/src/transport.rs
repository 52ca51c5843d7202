// File: deckhand-sync/src/transport.rs
// Purpose: Delegation of a single upload to blob storage or the document database

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransferError;
use crate::models::{PendingUpload, UploadKind};

/// Result of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferReceipt {
    /// Remote URL of uploaded binary content, if any
    pub remote_url: Option<String>,
    /// Identifier assigned by the document database, if any
    pub document_id: Option<String>,
}

/// Performs one transfer attempt for a queued upload
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn transfer(&self, upload: &PendingUpload) -> Result<TransferReceipt, TransferError>;
}

/// Binary storage service: `upload(local reference) -> remote URL`
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(&self, local_reference: &str) -> Result<String, TransferError>;
}

/// Remote document database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a document into a collection, returning its id
    async fn write(&self, collection: &str, document: &Value) -> Result<String, TransferError>;

    /// Point an expense record at its uploaded receipt
    async fn attach_receipt(&self, expense_id: &str, receipt_url: &str) -> Result<(), TransferError>;
}

/// Routes each upload kind to the matching collaborator
///
/// - `receipt-image`: uploads `local_reference`, then attaches the URL to the
///   expense named by `payload.expense_id`
/// - `structured-data`: writes `payload.document` into `payload.collection`
pub struct DelegatingTransport<B, D> {
    blobs: B,
    documents: D,
}

impl<B, D> DelegatingTransport<B, D>
where
    B: BlobStorage,
    D: DocumentStore,
{
    pub fn new(blobs: B, documents: D) -> Self {
        Self { blobs, documents }
    }

    async fn transfer_receipt(&self, upload: &PendingUpload) -> Result<TransferReceipt, TransferError> {
        let reference = upload
            .local_reference
            .as_deref()
            .ok_or(TransferError::MissingLocalReference(upload.id))?;
        let expense_id = payload_str(&upload.payload, "expense_id")?;

        let url = self.blobs.upload(reference).await?;
        self.documents.attach_receipt(expense_id, &url).await?;

        Ok(TransferReceipt {
            remote_url: Some(url),
            document_id: Some(expense_id.to_string()),
        })
    }

    async fn transfer_document(&self, upload: &PendingUpload) -> Result<TransferReceipt, TransferError> {
        let collection = payload_str(&upload.payload, "collection")?;
        let document = upload
            .payload
            .get("document")
            .ok_or_else(|| TransferError::InvalidPayload("missing `document`".to_string()))?;

        let document_id = self.documents.write(collection, document).await?;

        Ok(TransferReceipt {
            remote_url: None,
            document_id: Some(document_id),
        })
    }
}

#[async_trait]
impl<B, D> UploadTransport for DelegatingTransport<B, D>
where
    B: BlobStorage,
    D: DocumentStore,
{
    async fn transfer(&self, upload: &PendingUpload) -> Result<TransferReceipt, TransferError> {
        match upload.kind {
            UploadKind::ReceiptImage => self.transfer_receipt(upload).await,
            UploadKind::StructuredData => self.transfer_document(upload).await,
        }
    }
}

fn payload_str<'a>(payload: &'a Value, field: &str) -> Result<&'a str, TransferError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| TransferError::InvalidPayload(format!("missing `{}`", field)))
}
