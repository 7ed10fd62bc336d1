//! Merchant repository.

use sqlx::PgPool;
use tracing::instrument;

use receetly_core::Email;

use super::RepositoryError;
use crate::models::Merchant;

/// Repository for merchant database operations.
pub struct MerchantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MerchantRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All merchants, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Merchant>, RepositoryError> {
        let merchants = sqlx::query_as::<_, Merchant>(
            r"
            SELECT id, name, contact_email, created_at
            FROM merchants
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(merchants)
    }

    /// Insert a merchant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, contact_email))]
    pub async fn create(
        &self,
        name: &str,
        contact_email: Option<&Email>,
    ) -> Result<Merchant, RepositoryError> {
        let merchant = sqlx::query_as::<_, Merchant>(
            r"
            INSERT INTO merchants (name, contact_email)
            VALUES ($1, $2)
            RETURNING id, name, contact_email, created_at
            ",
        )
        .bind(name)
        .bind(contact_email)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(merchant_id = %merchant.id, "Merchant created");
        Ok(merchant)
    }
}
