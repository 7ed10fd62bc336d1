//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::blob::{BlobError, VercelBlobClient};
use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    blob: Option<VercelBlobClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the configured blob token cannot be used to build
    /// a blob client.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, BlobError> {
        let blob = config
            .blob
            .token
            .as_ref()
            .map(|token| VercelBlobClient::new(&config.blob.api_url, token))
            .transpose()?;

        if blob.is_none() {
            tracing::warn!("BLOB_READ_WRITE_TOKEN is not set; agent uploads will be refused");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { config, pool, blob }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the blob client, if a token is configured.
    #[must_use]
    pub fn blob(&self) -> Option<&VercelBlobClient> {
        self.inner.blob.as_ref()
    }
}
