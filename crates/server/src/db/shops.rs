//! Shop repository.

use sqlx::PgPool;
use tracing::instrument;

use receetly_core::MerchantId;

use super::RepositoryError;
use crate::models::Shop;

/// Repository for shop database operations.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All shops, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Shop>, RepositoryError> {
        let shops = sqlx::query_as::<_, Shop>(
            r"
            SELECT id, name, merchant_id, created_at
            FROM shops
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(shops)
    }

    /// Insert a shop for an existing merchant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the merchant does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str, merchant_id: MerchantId) -> Result<Shop, RepositoryError> {
        let shop = sqlx::query_as::<_, Shop>(
            r"
            INSERT INTO shops (name, merchant_id)
            VALUES ($1, $2)
            RETURNING id, name, merchant_id, created_at
            ",
        )
        .bind(name)
        .bind(merchant_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "shop already exists", "unknown merchant"))?;

        tracing::info!(shop_id = %shop.id, "Shop created");
        Ok(shop)
    }
}
