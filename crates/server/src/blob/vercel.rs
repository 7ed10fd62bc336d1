//! Vercel Blob API client.
//!
//! Objects are written with a single authenticated `PUT {api}/{pathname}`;
//! the response carries the public URL.

use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use super::{BlobError, BlobStore, StoredBlob};

/// Blob API version this client speaks.
const API_VERSION: &str = "7";

/// Vercel Blob API client.
#[derive(Clone)]
pub struct VercelBlobClient {
    client: reqwest::Client,
    api_url: String,
}

impl VercelBlobClient {
    /// Create a client authenticated with a read/write token.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(api_url: &str, token: &SecretString) -> Result<Self, BlobError> {
        let mut headers = HeaderMap::new();

        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| BlobError::Parse(format!("Invalid blob token format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        headers.insert("x-api-version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

impl BlobStore for VercelBlobClient {
    async fn put(
        &self,
        path: &str,
        body: Bytes,
        content_type: &'static str,
    ) -> Result<StoredBlob, BlobError> {
        let url = format!("{}/{path}", self.api_url);
        let size = body.len();

        let response = self
            .client
            .put(&url)
            .header("x-content-type", content_type)
            // Paths already carry a timestamp; keep them as given
            .header("x-add-random-suffix", "0")
            .body(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), path, "Blob upload rejected");
            return Err(BlobError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let stored: StoredBlob = response
            .json()
            .await
            .map_err(|e| BlobError::Parse(e.to_string()))?;

        tracing::debug!(path, size, url = %stored.url, "Blob stored");
        Ok(stored)
    }
}

impl std::fmt::Debug for VercelBlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VercelBlobClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
