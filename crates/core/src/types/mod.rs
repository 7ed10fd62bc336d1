//! Core types for Receetly.
//!
//! This module provides type-safe wrappers for the identifiers and contact
//! details that flow between the agent, the store and the waiting room.

pub mod email;
pub mod id;
pub mod public_id;

pub use email::{Email, EmailError};
pub use id::*;
pub use public_id::{PublicIdError, TerminalPublicId};
