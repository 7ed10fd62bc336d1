//! Terminal waiting room command.
//!
//! Polls until the terminal's receipt is ready, prints the download URL and
//! exits. Ctrl+C stops polling.

use receetly_core::WaitingRoomState;

use crate::waiting_room::{HttpSource, WaitingRoom};

/// Wait for the next receipt of `terminal`.
///
/// # Errors
///
/// Returns an error if the server URL is invalid or the waiting room ends in
/// its error state.
pub async fn run(server: &str, terminal: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let room = WaitingRoom::new(HttpSource::new(server)?, terminal);

    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler; wait without a way to cancel
            std::future::pending::<()>().await;
        }
    };

    let outcome = room
        .run(cancel, |state| {
            if matches!(state, WaitingRoomState::Waiting) {
                tracing::info!("Waiting for your receipt…");
            }
        })
        .await;

    match outcome {
        WaitingRoomState::Ready { url } => {
            #[allow(clippy::print_stdout)]
            {
                println!("{url}");
            }
            Ok(())
        }
        WaitingRoomState::Error { message } => Err(message.into()),
        WaitingRoomState::Idle | WaitingRoomState::Waiting => {
            tracing::info!("Stopped waiting");
            Ok(())
        }
    }
}
