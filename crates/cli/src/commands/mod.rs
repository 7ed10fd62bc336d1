//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod upload;
pub mod wait;

use secrecy::SecretString;

/// Database URL for the CLI, with the same fallback as the server.
pub(crate) fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();

    std::env::var("RECEETLY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "RECEETLY_DATABASE_URL not set")
}
