//! Business logic services for the Receetly server.
//!
//! # Services
//!
//! - `handoff` - Agent upload and the one-time latest-receipt claim
//! - `secret` - Constant-shape comparison of shared secrets

pub mod handoff;
pub mod secret;

pub use handoff::{
    HandoffError, HandoffStore, PgHandoffStore, UploadRequest, UploadedReceipt,
    claim_latest_receipt, upload_receipt,
};
pub use secret::secrets_match;
