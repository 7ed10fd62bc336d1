//! Waiting room poller for terminals and kiosks.
//!
//! Polls the latest-receipt endpoint immediately and then every
//! [`POLL_INTERVAL`] until the receipt is ready or an error is shown. The
//! state transitions themselves live in [`receetly_core::waiting`].

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use url::Url;

use receetly_core::handoff::LatestReceiptBody;
use receetly_core::waiting::POLL_INTERVAL;
use receetly_core::{PollOutcome, WaitingRoomState};

/// Where poll outcomes come from.
pub trait LatestReceiptSource: Send + Sync {
    /// Ask once for the latest receipt of `terminal`.
    fn poll(&self, terminal: &str) -> impl Future<Output = PollOutcome> + Send;
}

/// [`LatestReceiptSource`] backed by the server's HTTP API.
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSource {
    /// # Errors
    ///
    /// Returns an error if `server` is not a valid base URL.
    pub fn new(server: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: Url::parse(server)?.join("/api/receipts/latest")?,
        })
    }

    fn url_for(&self, terminal: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("terminalPublicId", terminal);
        url
    }
}

impl LatestReceiptSource for HttpSource {
    async fn poll(&self, terminal: &str) -> PollOutcome {
        let response = match self.client.get(self.url_for(terminal)).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Latest receipt request failed");
                return PollOutcome::Failed;
            }
        };

        // Error statuses still carry an {"error"} body worth showing
        match response.json::<LatestReceiptBody>().await {
            Ok(body) => body.into(),
            Err(e) => {
                tracing::warn!(error = %e, "Latest receipt response unreadable");
                PollOutcome::Failed
            }
        }
    }
}

/// A polling loop for one terminal.
pub struct WaitingRoom<S> {
    source: S,
    terminal: Option<String>,
    interval: Duration,
}

impl<S: LatestReceiptSource> WaitingRoom<S> {
    pub fn new(source: S, terminal: Option<String>) -> Self {
        Self {
            source,
            terminal: terminal.filter(|t| !t.trim().is_empty()),
            interval: POLL_INTERVAL,
        }
    }

    /// Poll until `Ready` or `Error`, or until `cancel` completes.
    ///
    /// `observe` is called on every state change. Cancelling drops any poll
    /// in flight, so a response arriving afterwards is never applied. Returns
    /// the state the loop ended in.
    pub async fn run<C, F>(&self, cancel: C, mut observe: F) -> WaitingRoomState
    where
        C: Future<Output = ()>,
        F: FnMut(&WaitingRoomState),
    {
        let Some(terminal) = self.terminal.as_deref() else {
            let state = WaitingRoomState::missing_terminal();
            observe(&state);
            return state;
        };

        tokio::pin!(cancel);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = WaitingRoomState::Idle;

        loop {
            tokio::select! {
                biased;
                () = &mut cancel => break,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                () = &mut cancel => break,
                outcome = self.source.poll(terminal) => outcome,
            };

            let next = state.clone().apply(outcome);
            if next != state {
                observe(&next);
            }
            state = next;

            if state.is_terminal() {
                return state;
            }
        }

        tracing::debug!(terminal, "Waiting room cancelled");
        state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use receetly_core::waiting::GENERIC_ERROR_MESSAGE;
    use tokio::time::Instant;

    use super::*;

    /// Replays scripted outcomes, then answers `Waiting` forever.
    struct Scripted {
        outcomes: Mutex<VecDeque<PollOutcome>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(outcomes: impl IntoIterator<Item = PollOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LatestReceiptSource for Scripted {
        async fn poll(&self, terminal: &str) -> PollOutcome {
            assert_eq!(terminal, "JOE-CBD-1");
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(PollOutcome::Waiting)
        }
    }

    fn room(source: Scripted) -> WaitingRoom<Scripted> {
        WaitingRoom::new(source, Some("JOE-CBD-1".to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_then_every_interval_until_ready() {
        let room = room(Scripted::new([
            PollOutcome::Waiting,
            PollOutcome::Waiting,
            PollOutcome::Ready("https://blob.example/r.pdf".to_string()),
        ]));
        let start = Instant::now();
        let mut seen = Vec::new();

        let end = room
            .run(std::future::pending(), |s| seen.push(s.clone()))
            .await;

        assert_eq!(
            end,
            WaitingRoomState::Ready {
                url: "https://blob.example/r.pdf".to_string()
            }
        );
        assert_eq!(room.source.calls(), 3);
        assert_eq!(start.elapsed(), POLL_INTERVAL * 2);
        // Waiting is reported once, not on every poll
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_stops_with_generic_message() {
        let room = room(Scripted::new([PollOutcome::Failed]));

        let end = room.run(std::future::pending(), |_| {}).await;

        assert_eq!(
            end,
            WaitingRoomState::Error {
                message: GENERIC_ERROR_MESSAGE.to_string()
            }
        );
        assert_eq!(room.source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_body_is_shown() {
        let room = room(Scripted::new([PollOutcome::Rejected(
            "Unknown terminalPublicId".to_string(),
        )]));

        let end = room.run(std::future::pending(), |_| {}).await;

        assert_eq!(
            end,
            WaitingRoomState::Error {
                message: "Unknown terminalPublicId".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let room = room(Scripted::new([]));
        let cancel = tokio::time::sleep(Duration::from_secs(7));

        let end = room.run(cancel, |_| {}).await;

        assert_eq!(end, WaitingRoomState::Waiting);
        // Polls at 0s, 3s and 6s
        assert_eq!(room.source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_in_flight_response() {
        let room = room(
            Scripted::new([PollOutcome::Ready("https://blob.example/r.pdf".to_string())])
                .slow(Duration::from_secs(10)),
        );
        let cancel = tokio::time::sleep(Duration::from_secs(1));

        let end = room.run(cancel, |_| {}).await;

        assert_eq!(end, WaitingRoomState::Idle);
        assert_eq!(room.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_terminal_never_polls() {
        let room = WaitingRoom::new(Scripted::new([]), Some("  ".to_string()));

        let end = room.run(std::future::pending(), |_| {}).await;

        assert_eq!(end, WaitingRoomState::missing_terminal());
        assert_eq!(room.source.calls(), 0);
    }

    #[test]
    fn test_http_source_url() {
        let source = HttpSource::new("https://receetly.example").unwrap();
        assert_eq!(
            source.url_for("JOE CBD").as_str(),
            "https://receetly.example/api/receipts/latest?terminalPublicId=JOE+CBD"
        );
    }
}
