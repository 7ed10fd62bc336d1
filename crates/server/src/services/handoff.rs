//! Receipt hand-off: the agent upload and the one-time latest-receipt claim.
//!
//! Both operations are written against [`HandoffStore`] and
//! [`BlobStore`](crate::blob::BlobStore) so the protocol runs the same
//! against `PostgreSQL` and against in-memory fakes.
//!
//! # Claim protocol
//!
//! 1. Resolve the terminal from its public id.
//! 2. Read the most recent receipt together with the store's clock.
//! 3. Classify it: expired or already claimed answers `waiting`.
//! 4. Attempt the conditional claim. Only the caller whose claim matched a
//!    row answers `ready`; every other caller answers `waiting`.

use std::future::Future;

use axum::body::Bytes;
use chrono::{TimeDelta, Utc};
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use receetly_core::blob_path::receipt_blob_path;
use receetly_core::{
    FRESHNESS_WINDOW, LatestReceipt, ReceiptId, TerminalId, TerminalPublicId,
};

use super::secret::secrets_match;
use crate::blob::{BlobError, BlobStore, PDF_CONTENT_TYPE};
use crate::db::{ReceiptRepository, RepositoryError, TerminalRepository};
use crate::models::{Receipt, ReceiptSnapshot, Terminal};

/// Errors raised by the hand-off operations.
///
/// The `Display` text of the client-facing variants is the message returned
/// in the `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// The agent secret was absent, wrong, or not configured.
    #[error("Unauthorized")]
    Unauthorized,

    /// No terminal public id was given.
    #[error("Missing terminalPublicId query parameter")]
    MissingTerminalId,

    /// The blob holder has no credentials.
    #[error("BLOB_READ_WRITE_TOKEN is not configured")]
    Misconfigured,

    /// No terminal has the given public id.
    #[error("Unknown terminalPublicId")]
    UnknownTerminal,

    /// The upload carried no bytes.
    #[error("Empty receipt body")]
    EmptyBody,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("blob error: {0}")]
    Blob(#[from] BlobError),
}

/// Persistence needed by the hand-off protocol.
pub trait HandoffStore: Send + Sync {
    /// Terminal with the given public id, if any.
    fn find_terminal(
        &self,
        public_id: &TerminalPublicId,
    ) -> impl Future<Output = Result<Option<Terminal>, RepositoryError>> + Send;

    /// Most recent receipt of a terminal, read with the store's clock.
    fn latest_receipt(
        &self,
        terminal_id: TerminalId,
    ) -> impl Future<Output = Result<Option<ReceiptSnapshot>, RepositoryError>> + Send;

    /// Mark a receipt claimed if it is unclaimed and within `freshness`.
    ///
    /// Returns the blob URL only to the caller that made the claim.
    fn claim_receipt(
        &self,
        receipt_id: ReceiptId,
        freshness: TimeDelta,
    ) -> impl Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Record an uploaded receipt.
    fn record_receipt(
        &self,
        terminal_id: TerminalId,
        blob_url: &str,
    ) -> impl Future<Output = Result<Receipt, RepositoryError>> + Send;
}

/// [`HandoffStore`] backed by the `PostgreSQL` repositories.
#[derive(Clone, Copy)]
pub struct PgHandoffStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgHandoffStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl HandoffStore for PgHandoffStore<'_> {
    async fn find_terminal(
        &self,
        public_id: &TerminalPublicId,
    ) -> Result<Option<Terminal>, RepositoryError> {
        TerminalRepository::new(self.pool)
            .get_by_public_id(public_id)
            .await
    }

    async fn latest_receipt(
        &self,
        terminal_id: TerminalId,
    ) -> Result<Option<ReceiptSnapshot>, RepositoryError> {
        ReceiptRepository::new(self.pool)
            .latest_for_terminal(terminal_id)
            .await
    }

    async fn claim_receipt(
        &self,
        receipt_id: ReceiptId,
        freshness: TimeDelta,
    ) -> Result<Option<String>, RepositoryError> {
        ReceiptRepository::new(self.pool)
            .claim(receipt_id, freshness)
            .await
    }

    async fn record_receipt(
        &self,
        terminal_id: TerminalId,
        blob_url: &str,
    ) -> Result<Receipt, RepositoryError> {
        ReceiptRepository::new(self.pool)
            .insert(terminal_id, blob_url)
            .await
    }
}

/// Resolve a raw public id to a terminal.
///
/// A value that is not a valid public id cannot name any terminal, so it is
/// reported the same way as a well-formed id that is not registered.
async fn resolve_terminal<S: HandoffStore>(
    store: &S,
    raw: Option<&str>,
) -> Result<Terminal, HandoffError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or(HandoffError::MissingTerminalId)?;
    let public_id = TerminalPublicId::parse(raw).map_err(|_| HandoffError::UnknownTerminal)?;

    store
        .find_terminal(&public_id)
        .await?
        .ok_or(HandoffError::UnknownTerminal)
}

/// Answer a waiting room poll, claiming the latest receipt if it is deliverable.
///
/// # Errors
///
/// Returns `HandoffError::MissingTerminalId` or `HandoffError::UnknownTerminal`
/// for a bad terminal id, and `HandoffError::Repository` if the store fails.
#[instrument(skip(store))]
pub async fn claim_latest_receipt<S: HandoffStore>(
    store: &S,
    terminal_public_id: Option<&str>,
) -> Result<LatestReceipt, HandoffError> {
    let terminal = resolve_terminal(store, terminal_public_id).await?;

    let Some(snapshot) = store.latest_receipt(terminal.id).await? else {
        return Ok(LatestReceipt::Waiting);
    };

    let state = snapshot.state();
    if !state.is_claimable() {
        tracing::debug!(receipt_id = %snapshot.receipt.id, ?state, "Latest receipt not deliverable");
        return Ok(LatestReceipt::Waiting);
    }

    match store
        .claim_receipt(snapshot.receipt.id, FRESHNESS_WINDOW)
        .await?
    {
        Some(url) => {
            tracing::info!(
                receipt_id = %snapshot.receipt.id,
                terminal = %terminal.public_id,
                "Receipt claimed"
            );
            Ok(LatestReceipt::Ready { url })
        }
        None => {
            tracing::debug!(receipt_id = %snapshot.receipt.id, "Lost claim race");
            Ok(LatestReceipt::Waiting)
        }
    }
}

/// An agent upload, as taken off the wire.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Value of the `x-agent-secret` header.
    pub secret: Option<String>,
    pub terminal_public_id: Option<String>,
    pub filename: Option<String>,
    pub body: Bytes,
}

/// A stored upload.
#[derive(Debug, Clone)]
pub struct UploadedReceipt {
    pub terminal: Terminal,
    pub receipt: Receipt,
}

/// Authenticate an agent upload, store the PDF and record the receipt.
///
/// Checks run in a fixed order: the secret, the terminal id being present,
/// the blob holder being configured, the terminal existing, the body being
/// non-empty. The blob holder is only called once all of them pass.
///
/// # Errors
///
/// Returns the `HandoffError` of the first check that fails, or
/// `HandoffError::Blob` / `HandoffError::Repository` if storing fails.
#[instrument(
    skip(store, blob, expected_secret, request),
    fields(terminal = request.terminal_public_id.as_deref(), size = request.body.len())
)]
pub async fn upload_receipt<S: HandoffStore, B: BlobStore>(
    store: &S,
    blob: Option<&B>,
    expected_secret: Option<&SecretString>,
    request: UploadRequest,
) -> Result<UploadedReceipt, HandoffError> {
    let authorized = match (expected_secret, request.secret.as_deref()) {
        (Some(expected), Some(presented)) => secrets_match(expected, presented),
        _ => false,
    };
    if !authorized {
        tracing::warn!("Rejected agent upload with bad secret");
        return Err(HandoffError::Unauthorized);
    }

    if request
        .terminal_public_id
        .as_deref()
        .is_none_or(|s| s.trim().is_empty())
    {
        return Err(HandoffError::MissingTerminalId);
    }

    let blob = blob.ok_or(HandoffError::Misconfigured)?;

    let terminal = resolve_terminal(store, request.terminal_public_id.as_deref()).await?;

    if request.body.is_empty() {
        return Err(HandoffError::EmptyBody);
    }

    let path = receipt_blob_path(&terminal.public_id, Utc::now(), request.filename.as_deref());
    let stored = blob.put(&path, request.body, PDF_CONTENT_TYPE).await?;

    let receipt = store.record_receipt(terminal.id, &stored.url).await?;

    tracing::info!(
        receipt_id = %receipt.id,
        terminal = %terminal.public_id,
        path = %stored.pathname,
        "Receipt uploaded"
    );

    Ok(UploadedReceipt { terminal, receipt })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::blob::StoredBlob;

    /// A store and blob holder that fail the test if they are ever reached.
    struct Untouched;

    impl HandoffStore for Untouched {
        async fn find_terminal(
            &self,
            _: &TerminalPublicId,
        ) -> Result<Option<Terminal>, RepositoryError> {
            panic!("store reached")
        }

        async fn latest_receipt(
            &self,
            _: TerminalId,
        ) -> Result<Option<ReceiptSnapshot>, RepositoryError> {
            panic!("store reached")
        }

        async fn claim_receipt(
            &self,
            _: ReceiptId,
            _: TimeDelta,
        ) -> Result<Option<String>, RepositoryError> {
            panic!("store reached")
        }

        async fn record_receipt(&self, _: TerminalId, _: &str) -> Result<Receipt, RepositoryError> {
            panic!("store reached")
        }
    }

    impl BlobStore for Untouched {
        async fn put(&self, _: &str, _: Bytes, _: &'static str) -> Result<StoredBlob, BlobError> {
            panic!("blob holder reached")
        }
    }

    fn request(secret: Option<&str>, terminal: Option<&str>) -> UploadRequest {
        UploadRequest {
            secret: secret.map(String::from),
            terminal_public_id: terminal.map(String::from),
            filename: None,
            body: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[tokio::test]
    async fn test_upload_without_configured_secret_is_unauthorized() {
        let err = upload_receipt(&Untouched, Some(&Untouched), None, request(Some("x"), Some("T1")))
            .await
            .unwrap_err();
        assert!(matches!(err, HandoffError::Unauthorized));
    }

    #[tokio::test]
    async fn test_upload_secret_checked_before_terminal_id() {
        let expected = SecretString::from("right");
        let err = upload_receipt(&Untouched, Some(&Untouched), Some(&expected), request(Some("wrong"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, HandoffError::Unauthorized));

        let err = upload_receipt(&Untouched, Some(&Untouched), Some(&expected), request(None, Some("T1")))
            .await
            .unwrap_err();
        assert!(matches!(err, HandoffError::Unauthorized));
    }

    #[tokio::test]
    async fn test_upload_blank_terminal_id_is_missing() {
        let expected = SecretString::from("right");
        let err = upload_receipt(&Untouched, Some(&Untouched), Some(&expected), request(Some("right"), Some("  ")))
            .await
            .unwrap_err();
        assert!(matches!(err, HandoffError::MissingTerminalId));
    }

    #[tokio::test]
    async fn test_upload_without_blob_holder_is_misconfigured() {
        let expected = SecretString::from("right");
        let err = upload_receipt::<_, Untouched>(&Untouched, None, Some(&expected), request(Some("right"), Some("T1")))
            .await
            .unwrap_err();
        assert!(matches!(err, HandoffError::Misconfigured));
    }

    #[tokio::test]
    async fn test_claim_requires_terminal_id() {
        let err = claim_latest_receipt(&Untouched, None).await.unwrap_err();
        assert!(matches!(err, HandoffError::MissingTerminalId));

        let err = claim_latest_receipt(&Untouched, Some("")).await.unwrap_err();
        assert!(matches!(err, HandoffError::MissingTerminalId));
    }

    #[tokio::test]
    async fn test_claim_malformed_id_is_unknown_terminal() {
        let err = claim_latest_receipt(&Untouched, Some("../etc/passwd"))
            .await
            .unwrap_err();
        assert!(matches!(err, HandoffError::UnknownTerminal));
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(HandoffError::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(
            HandoffError::MissingTerminalId.to_string(),
            "Missing terminalPublicId query parameter"
        );
        assert_eq!(
            HandoffError::Misconfigured.to_string(),
            "BLOB_READ_WRITE_TOKEN is not configured"
        );
        assert_eq!(HandoffError::UnknownTerminal.to_string(), "Unknown terminalPublicId");
    }
}
