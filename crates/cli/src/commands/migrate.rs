//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! receetly migrate
//! ```
//!
//! # Environment Variables
//!
//! - `RECEETLY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Migrations are embedded from `crates/server/migrations/` at build time.

use thiserror::Error;

use receetly_server::db;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("{0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().map_err(MigrationError::MissingEnvVar)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
