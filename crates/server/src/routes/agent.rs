//! Agent upload route handler.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Query, State,
        rejection::{BytesRejection, QueryRejection},
    },
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use receetly_core::TerminalPublicId;

use crate::error::Result;
use crate::services::{PgHandoffStore, UploadRequest, upload_receipt};
use crate::state::AppState;

/// Header carrying the agent's shared secret.
pub const AGENT_SECRET_HEADER: &str = "x-agent-secret";

/// Query parameters of an upload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub terminal_public_id: Option<String>,
    /// Original file name, used as a hint for the stored object name.
    pub filename: Option<String>,
}

/// Body returned for a stored upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub ok: bool,
    pub terminal_public_id: TerminalPublicId,
    pub terminal_name: String,
    pub blob_url: String,
}

/// Accept a receipt PDF from a point-of-sale agent.
///
/// POST /api/agent/upload?terminalPublicId=..&filename=..
///
/// The body is the raw PDF. A body over `UPLOAD_MAX_BYTES` is answered with
/// 413 and the usual `{"error"}` body.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<UploadQuery>, QueryRejection>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<UploadResponse>> {
    let Query(query) = query?;
    let body = body?;
    tracing::debug!(size = body.len(), "Receipt body received");

    let secret = headers
        .get(AGENT_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let request = UploadRequest {
        secret,
        terminal_public_id: query.terminal_public_id,
        filename: query.filename,
        body,
    };

    let uploaded = upload_receipt(
        &PgHandoffStore::new(state.pool()),
        state.blob(),
        state.config().agent_secret.as_ref(),
        request,
    )
    .await?;

    Ok(Json(UploadResponse {
        ok: true,
        terminal_public_id: uploaded.terminal.public_id,
        terminal_name: uploaded.terminal.name,
        blob_url: uploaded.receipt.blob_url,
    }))
}
