//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RECEETLY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `RECEETLY_HOST` - Bind address (default: 127.0.0.1)
//! - `RECEETLY_PORT` - Listen port (default: 3000)
//! - `RECEETLY_BASE_URL` - Public URL used in terminal QR links (default: <http://localhost:3000>)
//! - `AGENT_SECRET` - Shared secret expected in the `x-agent-secret` header
//! - `ADMIN_USER` / `ADMIN_PASS` - Basic auth credentials for `/admin`
//! - `BLOB_READ_WRITE_TOKEN` - Blob store token used for receipt uploads
//! - `BLOB_API_URL` - Blob store API endpoint (default: <https://blob.vercel-storage.com>)
//! - `UPLOAD_MAX_BYTES` - Largest accepted receipt body (default: 10 MiB)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! Unset access secrets never open a door: without `AGENT_SECRET` every
//! upload is unauthorized, without both admin variables every admin request
//! is challenged, and without a blob token uploads fail as misconfigured.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

use receetly_core::TerminalPublicId;

const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";
const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Receetly server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without a trailing slash
    pub base_url: String,
    /// Secret the upload agent must present
    pub agent_secret: Option<SecretString>,
    /// Basic auth credentials guarding the admin pages
    pub admin: Option<AdminCredentials>,
    /// Blob store settings
    pub blob: BlobConfig,
    /// Largest accepted upload body in bytes
    pub upload_max_bytes: usize,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry error tracking
    pub sentry: SentryConfig,
}

/// Credentials for the admin basic auth challenge.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub user: String,
    pub password: SecretString,
}

/// Blob store settings.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Read/write token; uploads are refused while this is unset
    pub token: Option<SecretString>,
    /// API endpoint objects are `PUT` to
    pub api_url: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Sentry settings. Error tracking is off when `dsn` is `None`.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("RECEETLY_DATABASE_URL")?;
        let host = parse_env_or_default("RECEETLY_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("RECEETLY_PORT", "3000")?;
        let base_url = get_env_or_default("RECEETLY_BASE_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();
        // QR codes are printed from this; catch typos at startup
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("RECEETLY_BASE_URL".to_string(), e.to_string())
        })?;

        let agent_secret = get_optional_env("AGENT_SECRET").map(SecretString::from);
        let admin = match (get_optional_env("ADMIN_USER"), get_optional_env("ADMIN_PASS")) {
            (Some(user), Some(password)) => Some(AdminCredentials {
                user,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            _ => {
                tracing::warn!("Only one of ADMIN_USER / ADMIN_PASS is set; admin pages stay locked");
                None
            }
        };

        let blob = BlobConfig {
            token: get_optional_env("BLOB_READ_WRITE_TOKEN").map(SecretString::from),
            api_url: get_env_or_default("BLOB_API_URL", DEFAULT_BLOB_API_URL)
                .trim_end_matches('/')
                .to_string(),
        };

        let upload_max_bytes =
            parse_env_or_default("UPLOAD_MAX_BYTES", &DEFAULT_UPLOAD_MAX_BYTES.to_string())?;

        let log_format = match get_optional_env("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let sentry = SentryConfig {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            agent_secret,
            admin,
            blob,
            upload_max_bytes,
            log_format,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Customer-facing waiting room URL for a terminal, as encoded in its QR code.
    #[must_use]
    pub fn waiting_room_url(&self, public_id: &TerminalPublicId) -> String {
        format!("{}/w/{public_id}", self.base_url)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}
