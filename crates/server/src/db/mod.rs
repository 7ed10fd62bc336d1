//! Database operations for the Receetly `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `merchants` - Businesses, created from the admin pages
//! - `shops` - Stores, each owned by one merchant
//! - `terminals` - Point-of-sale devices, addressed publicly by `public_id`
//! - `receipts` - Uploaded receipts and their one-time `downloaded_at` claim
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p receetly-cli -- migrate
//! ```

pub mod merchants;
pub mod receipts;
pub mod shops;
pub mod terminals;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use merchants::MerchantRepository;
pub use receipts::ReceiptRepository;
pub use shops::ShopRepository;
pub use terminals::TerminalRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violation (e.g., duplicate terminal public id).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Foreign key violation (e.g., shop for a merchant that does not exist).
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

impl RepositoryError {
    /// Classify an insert failure, naming the offending value in the message.
    pub(crate) fn from_insert(err: sqlx::Error, conflict: &str, reference: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(conflict.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::InvalidReference(reference.to_owned());
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
