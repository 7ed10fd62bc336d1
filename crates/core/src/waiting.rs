//! Waiting room state machine.
//!
//! ```text
//!   Idle ──► Waiting ⇄ Waiting ──► Ready   (terminal)
//!     └──────────┴───────────────► Error   (terminal)
//! ```
//!
//! The machine is pure: a poller feeds it one [`PollOutcome`] per tick and
//! stops as soon as [`WaitingRoomState::is_terminal`] holds. Once terminal,
//! further outcomes (a late response racing a cancelled timer) are ignored.

use std::time::Duration;

use serde::Serialize;

use crate::handoff::{LatestReceipt, LatestReceiptBody};

/// Fixed delay between polls. The first poll fires immediately.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Message shown when the transport or the response body fails.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Message shown when no terminal id was supplied.
pub const MISSING_TERMINAL_MESSAGE: &str = "Missing terminal ID in URL.";

/// Result of one poll of the latest-receipt endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Waiting,
    Ready(String),
    /// The endpoint answered with an `{error}` body.
    Rejected(String),
    /// The request failed or the body could not be parsed.
    Failed,
}

impl From<LatestReceiptBody> for PollOutcome {
    fn from(body: LatestReceiptBody) -> Self {
        match body {
            LatestReceiptBody::Status(LatestReceipt::Waiting) => Self::Waiting,
            LatestReceiptBody::Status(LatestReceipt::Ready { url }) => Self::Ready(url),
            LatestReceiptBody::Error { error } => Self::Rejected(error),
        }
    }
}

/// What the customer currently sees.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum WaitingRoomState {
    #[default]
    Idle,
    Waiting,
    Ready {
        url: String,
    },
    Error {
        message: String,
    },
}

impl WaitingRoomState {
    /// Initial state for a waiting room opened without a terminal id.
    #[must_use]
    pub fn missing_terminal() -> Self {
        Self::Error {
            message: MISSING_TERMINAL_MESSAGE.to_string(),
        }
    }

    /// `Ready` and `Error` end the polling loop.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Error { .. })
    }

    /// Advance by one poll outcome.
    ///
    /// Terminal states absorb every outcome unchanged.
    #[must_use]
    pub fn apply(self, outcome: PollOutcome) -> Self {
        if self.is_terminal() {
            return self;
        }
        match outcome {
            PollOutcome::Waiting => Self::Waiting,
            PollOutcome::Ready(url) => Self::Ready { url },
            PollOutcome::Rejected(message) => Self::Error { message },
            PollOutcome::Failed => Self::Error {
                message: GENERIC_ERROR_MESSAGE.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_to_waiting_and_back() {
        let state = WaitingRoomState::Idle.apply(PollOutcome::Waiting);
        assert_eq!(state, WaitingRoomState::Waiting);
        let state = state.apply(PollOutcome::Waiting);
        assert_eq!(state, WaitingRoomState::Waiting);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_ready_is_terminal_and_sticky() {
        let state = WaitingRoomState::Waiting.apply(PollOutcome::Ready("https://r".to_string()));
        assert!(state.is_terminal());

        let after = state
            .clone()
            .apply(PollOutcome::Waiting)
            .apply(PollOutcome::Failed);
        assert_eq!(after, state);
    }

    #[test]
    fn test_failure_uses_generic_message() {
        let state = WaitingRoomState::Idle.apply(PollOutcome::Failed);
        assert_eq!(
            state,
            WaitingRoomState::Error {
                message: GENERIC_ERROR_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn test_rejection_keeps_endpoint_message() {
        let state =
            WaitingRoomState::Waiting.apply(PollOutcome::Rejected("Unknown terminalPublicId".into()));
        assert_eq!(
            state,
            WaitingRoomState::Error {
                message: "Unknown terminalPublicId".to_string()
            }
        );
    }

    #[test]
    fn test_missing_terminal_starts_terminal() {
        assert!(WaitingRoomState::missing_terminal().is_terminal());
    }

    #[test]
    fn test_outcome_from_body() {
        assert_eq!(
            PollOutcome::from(LatestReceiptBody::Status(LatestReceipt::Ready {
                url: "u".to_string()
            })),
            PollOutcome::Ready("u".to_string())
        );
    }
}
