//! Receetly Core - shared types and hand-off rules.
//!
//! This crate provides the pieces shared by every Receetly component:
//! - `server` - Agent upload API, customer waiting room, admin pages
//! - `cli` - Migrations, seeding, the agent uploader and the terminal waiting room
//!
//! # Architecture
//!
//! The core crate contains only types and pure decision logic - no I/O, no
//! database access, no HTTP clients. The server and the CLI both lean on the
//! same rules so that a receipt is classified identically wherever it is seen.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, terminal public ids and contact emails
//! - [`handoff`] - Freshness window and one-time claim classification
//! - [`blob_path`] - Naming of uploaded receipt objects
//! - [`waiting`] - Waiting room state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod blob_path;
pub mod handoff;
pub mod types;
pub mod waiting;

pub use handoff::{FRESHNESS_WINDOW, LatestReceipt, ReceiptState};
pub use types::*;
pub use waiting::{PollOutcome, WaitingRoomState};
