//! Latest-receipt route handler.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use tracing::instrument;

use receetly_core::LatestReceipt;

use crate::error::Result;
use crate::services::{PgHandoffStore, claim_latest_receipt};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestQuery {
    pub terminal_public_id: Option<String>,
}

/// Answer a waiting room poll.
///
/// GET /api/receipts/latest?terminalPublicId=..
///
/// Returns `{"status":"ready","url":..}` to exactly one poller per receipt
/// and `{"status":"waiting"}` to everyone else.
#[instrument(skip(state))]
pub async fn latest(
    State(state): State<AppState>,
    query: std::result::Result<Query<LatestQuery>, QueryRejection>,
) -> Result<Json<LatestReceipt>> {
    let Query(query) = query?;
    let answer = claim_latest_receipt(
        &PgHandoffStore::new(state.pool()),
        query.terminal_public_id.as_deref(),
    )
    .await?;

    Ok(Json(answer))
}
