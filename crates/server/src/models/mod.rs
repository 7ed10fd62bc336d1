//! Rows of the four Receetly relations.
//!
//! Merchants, shops and terminals are long-lived tenancy records written by
//! the admin pages. Receipts are short-lived: written by the agent upload and
//! claimed at most once by a waiting room.

use chrono::{DateTime, Utc};
use serde::Serialize;

use receetly_core::{
    Email, MerchantId, ReceiptId, ReceiptState, ShopId, TerminalId, TerminalPublicId,
};

/// A business using Receetly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Merchant {
    pub id: MerchantId,
    pub name: String,
    pub contact_email: Option<Email>,
    pub created_at: DateTime<Utc>,
}

/// A physical store belonging to a merchant.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub merchant_id: MerchantId,
    pub created_at: DateTime<Utc>,
}

/// A point-of-sale device. Customers only ever see its `public_id`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Terminal {
    pub id: TerminalId,
    pub name: String,
    pub shop_id: ShopId,
    pub public_id: TerminalPublicId,
    pub created_at: DateTime<Utc>,
}

/// An uploaded receipt.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Receipt {
    pub id: ReceiptId,
    pub terminal_id: TerminalId,
    pub blob_url: String,
    pub created_at: DateTime<Utc>,
    /// Set once, when a waiting room claims the receipt.
    pub downloaded_at: Option<DateTime<Utc>>,
}

/// A receipt read together with the store's clock at read time.
///
/// Ages are measured against `observed_at` rather than the application
/// clock, so `created_at` and "now" always come from the same source.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReceiptSnapshot {
    #[sqlx(flatten)]
    pub receipt: Receipt,
    pub observed_at: DateTime<Utc>,
}

impl ReceiptSnapshot {
    #[must_use]
    pub fn state(&self) -> ReceiptState {
        ReceiptState::classify(
            self.receipt.created_at,
            self.receipt.downloaded_at,
            self.observed_at,
        )
    }
}
