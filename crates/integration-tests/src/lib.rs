//! Integration tests for Receetly.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p receetly-integration-tests
//! ```
//!
//! The protocol tests run the server's hand-off service against the
//! in-memory [`MemoryStore`] and [`MemoryBlobStore`] defined here, so they
//! need no database and no blob credentials. The HTTP tests drive the real
//! router with a pool that never connects; they only cover requests that are
//! answered before any query runs.
//!
//! # Test Categories
//!
//! - `handoff_protocol` - One-time claim of the latest receipt
//! - `agent_upload` - Agent upload checks and storage
//! - `http_api` - Status codes, bodies and headers of the router

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, PoisonError};

use axum::body::Bytes;
use chrono::{DateTime, TimeDelta, Utc};

use receetly_core::{ReceiptId, ShopId, TerminalId, TerminalPublicId};
use receetly_server::blob::{BlobError, BlobStore, StoredBlob};
use receetly_server::db::RepositoryError;
use receetly_server::models::{Receipt, ReceiptSnapshot, Terminal};
use receetly_server::services::HandoffStore;

/// Base URL of objects written to [`MemoryBlobStore`].
pub const MEMORY_BLOB_BASE: &str = "https://blob.test";

#[derive(Default)]
struct Tables {
    terminals: Vec<Terminal>,
    receipts: Vec<Receipt>,
}

/// In-memory [`HandoffStore`] with a settable clock.
///
/// Mirrors the `PostgreSQL` store: the latest receipt is the one with the
/// greatest `(created_at, id)`, ages are measured against the store's own
/// clock, and a claim only matches an unclaimed receipt inside the window.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    now: Mutex<DateTime<Utc>>,
    next_id: AtomicI32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            now: Mutex::new(Utc::now()),
            next_id: AtomicI32::new(1),
        }
    }

    fn next_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The store's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the store's clock forward.
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Register a terminal.
    ///
    /// # Panics
    ///
    /// Panics if `public_id` is not a valid public id.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn add_terminal(&self, name: &str, public_id: &str) -> Terminal {
        let terminal = Terminal {
            id: TerminalId::new(self.next_id()),
            name: name.to_string(),
            shop_id: ShopId::new(1),
            public_id: TerminalPublicId::parse(public_id).unwrap(),
            created_at: self.now(),
        };
        self.tables().terminals.push(terminal.clone());
        terminal
    }

    /// Insert a receipt created `age` before the store's clock.
    pub fn insert_receipt_aged(&self, terminal_id: TerminalId, blob_url: &str, age: TimeDelta) -> Receipt {
        let receipt = Receipt {
            id: ReceiptId::new(self.next_id()),
            terminal_id,
            blob_url: blob_url.to_string(),
            created_at: self.now() - age,
            downloaded_at: None,
        };
        self.tables().receipts.push(receipt.clone());
        receipt
    }

    /// Every stored receipt, in insertion order.
    #[must_use]
    pub fn receipts(&self) -> Vec<Receipt> {
        self.tables().receipts.clone()
    }

    /// A stored receipt by id.
    #[must_use]
    pub fn receipt(&self, id: ReceiptId) -> Option<Receipt> {
        self.tables().receipts.iter().find(|r| r.id == id).cloned()
    }
}

impl HandoffStore for MemoryStore {
    async fn find_terminal(
        &self,
        public_id: &TerminalPublicId,
    ) -> Result<Option<Terminal>, RepositoryError> {
        Ok(self
            .tables()
            .terminals
            .iter()
            .find(|t| &t.public_id == public_id)
            .cloned())
    }

    async fn latest_receipt(
        &self,
        terminal_id: TerminalId,
    ) -> Result<Option<ReceiptSnapshot>, RepositoryError> {
        let observed_at = self.now();
        let snapshot = self
            .tables()
            .receipts
            .iter()
            .filter(|r| r.terminal_id == terminal_id)
            .max_by_key(|r| (r.created_at, r.id))
            .cloned()
            .map(|receipt| ReceiptSnapshot {
                receipt,
                observed_at,
            });

        // Give concurrent pollers a chance to interleave between read and claim
        tokio::task::yield_now().await;
        Ok(snapshot)
    }

    async fn claim_receipt(
        &self,
        receipt_id: ReceiptId,
        freshness: TimeDelta,
    ) -> Result<Option<String>, RepositoryError> {
        let now = self.now();
        let mut tables = self.tables();
        let claimed = tables
            .receipts
            .iter_mut()
            .find(|r| r.id == receipt_id && r.downloaded_at.is_none() && r.created_at >= now - freshness)
            .map(|r| {
                r.downloaded_at = Some(now);
                r.blob_url.clone()
            });
        Ok(claimed)
    }

    async fn record_receipt(
        &self,
        terminal_id: TerminalId,
        blob_url: &str,
    ) -> Result<Receipt, RepositoryError> {
        if !self.tables().terminals.iter().any(|t| t.id == terminal_id) {
            return Err(RepositoryError::InvalidReference("unknown terminal".to_string()));
        }
        Ok(self.insert_receipt_aged(terminal_id, blob_url, TimeDelta::zero()))
    }
}

/// A recorded [`BlobStore::put`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCall {
    pub path: String,
    pub body: Bytes,
    pub content_type: &'static str,
}

/// In-memory [`BlobStore`] that records every call.
#[derive(Default)]
pub struct MemoryBlobStore {
    calls: Mutex<Vec<PutCall>>,
    /// When set, every put fails with this HTTP status.
    fail_with: Option<u16>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A holder whose puts all fail.
    #[must_use]
    pub fn failing(status: u16) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(status),
        }
    }

    /// Every put made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<PutCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        path: &str,
        body: Bytes,
        content_type: &'static str,
    ) -> Result<StoredBlob, BlobError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PutCall {
                path: path.to_string(),
                body,
                content_type,
            });

        if let Some(status) = self.fail_with {
            return Err(BlobError::Api {
                status,
                message: "unavailable".to_string(),
            });
        }

        Ok(StoredBlob {
            url: format!("{MEMORY_BLOB_BASE}/{path}"),
            pathname: path.to_string(),
        })
    }
}
