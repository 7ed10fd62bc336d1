//! Receipt repository.
//!
//! Receipts are inserted by the agent upload and read back by the waiting
//! room. The only update ever made to a receipt is the claim, which is a
//! compare-and-set on `downloaded_at IS NULL`: of any number of concurrent
//! pollers, exactly one sees a row come back.

use chrono::TimeDelta;
use sqlx::PgPool;
use tracing::instrument;

use receetly_core::{ReceiptId, TerminalId};

use super::RepositoryError;
use crate::models::{Receipt, ReceiptSnapshot};

/// Repository for receipt database operations.
pub struct ReceiptRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReceiptRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record an uploaded receipt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the terminal does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, blob_url))]
    pub async fn insert(
        &self,
        terminal_id: TerminalId,
        blob_url: &str,
    ) -> Result<Receipt, RepositoryError> {
        let receipt = sqlx::query_as::<_, Receipt>(
            r"
            INSERT INTO receipts (terminal_id, blob_url)
            VALUES ($1, $2)
            RETURNING id, terminal_id, blob_url, created_at, downloaded_at
            ",
        )
        .bind(terminal_id)
        .bind(blob_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "receipt already exists", "unknown terminal"))?;

        Ok(receipt)
    }

    /// The most recent receipt of a terminal, with the database clock.
    ///
    /// Ordered by `created_at`, then by id so that receipts inserted within
    /// the same clock tick still resolve to the last one inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_terminal(
        &self,
        terminal_id: TerminalId,
    ) -> Result<Option<ReceiptSnapshot>, RepositoryError> {
        let snapshot = sqlx::query_as::<_, ReceiptSnapshot>(
            r"
            SELECT id, terminal_id, blob_url, created_at, downloaded_at,
                   NOW() AS observed_at
            FROM receipts
            WHERE terminal_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(terminal_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(snapshot)
    }

    /// Claim a receipt, returning its URL only if this call made the claim.
    ///
    /// The update matches only while the receipt is unclaimed and still
    /// inside `freshness`; `None` means another poller got there first or the
    /// receipt aged out between read and claim.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self))]
    pub async fn claim(
        &self,
        receipt_id: ReceiptId,
        freshness: TimeDelta,
    ) -> Result<Option<String>, RepositoryError> {
        #[allow(clippy::cast_precision_loss)] // The window is minutes long
        let window_secs = freshness.num_milliseconds() as f64 / 1000.0;

        let url = sqlx::query_scalar::<_, String>(
            r"
            UPDATE receipts
            SET downloaded_at = NOW()
            WHERE id = $1
              AND downloaded_at IS NULL
              AND created_at >= NOW() - make_interval(secs => $2)
            RETURNING blob_url
            ",
        )
        .bind(receipt_id)
        .bind(window_secs)
        .fetch_optional(self.pool)
        .await?;

        Ok(url)
    }
}
