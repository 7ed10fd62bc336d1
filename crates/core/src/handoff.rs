//! One-time receipt hand-off rules.
//!
//! A receipt is offered to the waiting room at most once and only while it is
//! fresh. The store decides *who* wins a claim (see the conditional update in
//! the server's receipt repository); this module decides *whether* the most
//! recent receipt of a terminal is claimable at all.
//!
//! ```text
//!            age > window                     age > window
//!   Pending ──────────────► Expired ◄──────────────────── Claimed
//!      │                                                     ▲
//!      └───────────── reported as ready (claim) ─────────────┘
//! ```
//!
//! Every state except `Pending` is reported to the waiting room as `waiting`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Age beyond which a receipt is never delivered, claimed or not.
pub const FRESHNESS_WINDOW: TimeDelta = TimeDelta::minutes(30);

/// Delivery state of a stored receipt at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptState {
    /// Fresh and never delivered.
    Pending,
    /// Already delivered to a waiting room.
    Claimed,
    /// Older than [`FRESHNESS_WINDOW`].
    Expired,
}

impl ReceiptState {
    /// Classify a receipt row.
    ///
    /// The age check runs before the claim check, so an expired receipt is
    /// `Expired` even if it was claimed. A receipt exactly
    /// [`FRESHNESS_WINDOW`] old is still fresh. A `created_at` in the future
    /// (clock skew between app and database) counts as fresh.
    #[must_use]
    pub fn classify(
        created_at: DateTime<Utc>,
        downloaded_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        if now.signed_duration_since(created_at) > FRESHNESS_WINDOW {
            Self::Expired
        } else if downloaded_at.is_some() {
            Self::Claimed
        } else {
            Self::Pending
        }
    }

    /// Whether a poll observing this state may attempt the claim.
    #[must_use]
    pub const fn is_claimable(self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Answer of the latest-receipt query.
///
/// Serializes as `{"status":"waiting"}` or `{"status":"ready","url":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LatestReceipt {
    Waiting,
    Ready { url: String },
}

/// Any body the latest-receipt endpoint can answer with, including its
/// `{"error": "..."}` failures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LatestReceiptBody {
    Status(LatestReceipt),
    Error { error: String },
}
