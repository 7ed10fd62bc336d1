//! Terminal repository.
//!
//! Terminals are looked up by their public id on every upload and every
//! waiting room poll, backed by the `terminals_public_id_key` unique index.

use sqlx::PgPool;
use tracing::instrument;

use receetly_core::{ShopId, TerminalPublicId};

use super::RepositoryError;
use crate::models::Terminal;

/// Repository for terminal database operations.
pub struct TerminalRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TerminalRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the terminal with the given public id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_public_id(
        &self,
        public_id: &TerminalPublicId,
    ) -> Result<Option<Terminal>, RepositoryError> {
        let terminal = sqlx::query_as::<_, Terminal>(
            r"
            SELECT id, name, shop_id, public_id, created_at
            FROM terminals
            WHERE public_id = $1
            ",
        )
        .bind(public_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(terminal)
    }

    /// All terminals, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Terminal>, RepositoryError> {
        self.list(None).await
    }

    /// The `limit` most recently created terminals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Terminal>, RepositoryError> {
        self.list(Some(limit)).await
    }

    async fn list(&self, limit: Option<i64>) -> Result<Vec<Terminal>, RepositoryError> {
        // LIMIT NULL means no limit in Postgres
        let terminals = sqlx::query_as::<_, Terminal>(
            r"
            SELECT id, name, shop_id, public_id, created_at
            FROM terminals
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(terminals)
    }

    /// Insert a terminal for an existing shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the public id is already taken.
    /// Returns `RepositoryError::InvalidReference` if the shop does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(public_id = %public_id))]
    pub async fn create(
        &self,
        name: &str,
        shop_id: ShopId,
        public_id: &TerminalPublicId,
    ) -> Result<Terminal, RepositoryError> {
        let terminal = sqlx::query_as::<_, Terminal>(
            r"
            INSERT INTO terminals (name, shop_id, public_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, shop_id, public_id, created_at
            ",
        )
        .bind(name)
        .bind(shop_id)
        .bind(public_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_insert(
                e,
                &format!("public id {public_id} is already in use"),
                "unknown shop",
            )
        })?;

        tracing::info!(terminal_id = %terminal.id, "Terminal created");
        Ok(terminal)
    }
}
