//! Terminal listing for checking QR setups.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use receetly_core::TerminalPublicId;

use crate::db::TerminalRepository;
use crate::error::Result;
use crate::models::Terminal;
use crate::state::AppState;

/// Terminals listed when no public id is given.
pub const RECENT_TERMINALS_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugQuery {
    pub public_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TerminalListing {
    pub count: usize,
    pub terminals: Vec<Terminal>,
}

impl From<Vec<Terminal>> for TerminalListing {
    fn from(terminals: Vec<Terminal>) -> Self {
        Self {
            count: terminals.len(),
            terminals,
        }
    }
}

/// List terminals.
///
/// GET /api/debug/terminals[?publicId=..]
///
/// With `publicId`, the matching terminal (zero or one); without, the most
/// recently created ones.
#[instrument(skip(state))]
pub async fn terminals(
    State(state): State<AppState>,
    query: std::result::Result<Query<DebugQuery>, QueryRejection>,
) -> Result<Json<TerminalListing>> {
    let Query(query) = query?;
    let repo = TerminalRepository::new(state.pool());

    let terminals = match query.public_id.as_deref() {
        Some(raw) => match TerminalPublicId::parse(raw) {
            Ok(public_id) => repo.get_by_public_id(&public_id).await?.into_iter().collect(),
            // A malformed id matches nothing
            Err(_) => Vec::new(),
        },
        None => repo.list_recent(RECENT_TERMINALS_LIMIT).await?,
    };

    Ok(Json(terminals.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use receetly_core::{ShopId, TerminalId};

    use super::*;

    #[test]
    fn test_listing_wire_format() {
        let terminal = Terminal {
            id: TerminalId::new(7),
            name: "Till 1".to_string(),
            shop_id: ShopId::new(3),
            public_id: TerminalPublicId::parse("JOE-CBD-1").unwrap(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(TerminalListing::from(vec![terminal])).unwrap();

        assert_eq!(json["count"], 1);
        assert_eq!(json["terminals"][0]["publicId"], "JOE-CBD-1");
        assert_eq!(json["terminals"][0]["shopId"], 3);
        assert!(json["terminals"][0]["createdAt"].is_string());
    }
}
