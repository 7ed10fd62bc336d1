//! Customer-facing waiting room page.
//!
//! The page is rendered once by the server; `static/waiting-room.js` then
//! polls the latest-receipt endpoint and swaps between the panels. The
//! terminal id is handed to the script through a `data-terminal` attribute.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Path;
use tracing::instrument;

use receetly_core::WaitingRoomState;
use receetly_core::waiting::POLL_INTERVAL;

use crate::ASSET_VERSION;

/// Waiting room page template.
#[derive(Template, WebTemplate)]
#[template(path = "waiting_room.html")]
pub struct WaitingRoomTemplate {
    /// Terminal id as it appeared in the URL, if any.
    pub terminal_public_id: Option<String>,
    /// State rendered before the first poll.
    pub state: WaitingRoomState,
    pub poll_interval_ms: u128,
    pub asset_version: &'static str,
}

impl WaitingRoomTemplate {
    fn new(terminal_public_id: Option<String>) -> Self {
        let state = if terminal_public_id.is_some() {
            WaitingRoomState::Idle
        } else {
            WaitingRoomState::missing_terminal()
        };
        Self {
            terminal_public_id,
            state,
            poll_interval_ms: POLL_INTERVAL.as_millis(),
            asset_version: ASSET_VERSION,
        }
    }

    /// Message of the initial error state, if the page starts in one.
    fn error_message(&self) -> Option<&str> {
        match &self.state {
            WaitingRoomState::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Render the waiting room for a terminal.
///
/// GET /w/{terminalPublicId}
#[instrument]
pub async fn show(Path(terminal_public_id): Path<String>) -> WaitingRoomTemplate {
    let trimmed = terminal_public_id.trim();
    WaitingRoomTemplate::new((!trimmed.is_empty()).then(|| trimmed.to_owned()))
}

/// Render the waiting room opened without a terminal id.
///
/// GET /w
pub async fn missing_terminal() -> WaitingRoomTemplate {
    WaitingRoomTemplate::new(None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_carries_terminal_for_script() {
        let html = WaitingRoomTemplate::new(Some("JOE-CBD-1".to_string()))
            .render()
            .unwrap();
        assert!(html.contains(r#"data-terminal="JOE-CBD-1""#));
        assert!(html.contains(r#"data-poll-interval="3000""#));
        assert!(html.contains("Waiting for your receipt"));
    }

    #[test]
    fn test_page_without_terminal_starts_in_error() {
        let html = WaitingRoomTemplate::new(None).render().unwrap();
        assert!(!html.contains("data-terminal="));
        assert!(html.contains("Missing terminal ID in URL."));
        assert!(html.contains("(not found)"));
    }

    #[test]
    fn test_terminal_id_is_escaped() {
        let html = WaitingRoomTemplate::new(Some(r#""><script>"#.to_string()))
            .render()
            .unwrap();
        assert!(!html.contains(r#""><script>"#));
    }
}
