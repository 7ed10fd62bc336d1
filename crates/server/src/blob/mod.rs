//! Blob holder for receipt PDFs.
//!
//! Receipts are not kept in the database: the PDF goes to an external object
//! store that hands back a durable public URL, and only that URL is stored.
//! [`BlobStore`] is the seam; [`VercelBlobClient`] is the production holder.

pub mod vercel;

use std::future::Future;

use axum::body::Bytes;
use serde::Deserialize;
use thiserror::Error;

pub use vercel::VercelBlobClient;

/// Content type stored with every receipt object.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Errors that can occur when writing to the blob holder.
#[derive(Debug, Error)]
pub enum BlobError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the request or parse the response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// An object written to the blob holder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    /// Public URL the object is served from.
    pub url: String,
    /// Path the holder stored the object under.
    pub pathname: String,
}

/// Somewhere receipt PDFs can be written to and served from.
pub trait BlobStore: Send + Sync {
    /// Store `body` at `path` with public read access.
    fn put(
        &self,
        path: &str,
        body: Bytes,
        content_type: &'static str,
    ) -> impl Future<Output = Result<StoredBlob, BlobError>> + Send;
}
