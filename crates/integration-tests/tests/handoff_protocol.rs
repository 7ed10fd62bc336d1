//! Integration tests for the one-time latest-receipt claim.
//!
//! Every poll goes through `claim_latest_receipt`, the same service the
//! `GET /api/receipts/latest` handler calls.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::TimeDelta;

use receetly_core::{FRESHNESS_WINDOW, LatestReceipt};
use receetly_integration_tests::MemoryStore;
use receetly_server::services::{HandoffError, claim_latest_receipt};

const URL: &str = "https://blob.test/receipts/JOE-CBD-1/r.pdf";

fn ready(url: &str) -> LatestReceipt {
    LatestReceipt::Ready {
        url: url.to_string(),
    }
}

// =============================================================================
// Basic States
// =============================================================================

#[tokio::test]
async fn test_no_receipt_is_waiting() {
    let store = MemoryStore::new();
    let _ = store.add_terminal("Till 1", "JOE-CBD-1");

    let answer = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
    assert_eq!(answer, LatestReceipt::Waiting);
}

#[tokio::test]
async fn test_fresh_receipt_is_ready_exactly_once() {
    let store = MemoryStore::new();
    let terminal = store.add_terminal("Till 1", "JOE-CBD-1");
    let receipt = store.insert_receipt_aged(terminal.id, URL, TimeDelta::seconds(5));

    let first = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
    assert_eq!(first, ready(URL));
    assert!(store.receipt(receipt.id).unwrap().downloaded_at.is_some());

    for _ in 0..3 {
        let again = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
        assert_eq!(again, LatestReceipt::Waiting);
    }
}

#[tokio::test]
async fn test_claimed_receipt_is_never_reclaimed() {
    let store = MemoryStore::new();
    let terminal = store.add_terminal("Till 1", "JOE-CBD-1");
    let receipt = store.insert_receipt_aged(terminal.id, URL, TimeDelta::zero());

    let _ = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
    let claimed_at = store.receipt(receipt.id).unwrap().downloaded_at;

    store.advance(TimeDelta::minutes(5));
    let answer = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();

    assert_eq!(answer, LatestReceipt::Waiting);
    // The claim timestamp is written once
    assert_eq!(store.receipt(receipt.id).unwrap().downloaded_at, claimed_at);
}

// =============================================================================
// Freshness Window
// =============================================================================

#[tokio::test]
async fn test_receipt_older_than_window_is_waiting_on_first_poll() {
    let store = MemoryStore::new();
    let terminal = store.add_terminal("Till 1", "JOE-CBD-1");
    let receipt = store.insert_receipt_aged(terminal.id, URL, TimeDelta::minutes(31));

    let answer = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();

    assert_eq!(answer, LatestReceipt::Waiting);
    assert!(store.receipt(receipt.id).unwrap().downloaded_at.is_none());
}

#[tokio::test]
async fn test_receipt_exactly_at_window_is_ready() {
    let store = MemoryStore::new();
    let terminal = store.add_terminal("Till 1", "JOE-CBD-1");
    let _ = store.insert_receipt_aged(terminal.id, URL, FRESHNESS_WINDOW);

    let answer = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
    assert_eq!(answer, ready(URL));
}

#[tokio::test]
async fn test_receipt_expires_while_unclaimed() {
    let store = MemoryStore::new();
    let terminal = store.add_terminal("Till 1", "JOE-CBD-1");
    let _ = store.insert_receipt_aged(terminal.id, URL, TimeDelta::zero());

    store.advance(FRESHNESS_WINDOW + TimeDelta::seconds(1));

    let answer = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
    assert_eq!(answer, LatestReceipt::Waiting);
}

// =============================================================================
// Latest Receipt Selection
// =============================================================================

#[tokio::test]
async fn test_only_the_latest_receipt_is_offered() {
    let store = MemoryStore::new();
    let terminal = store.add_terminal("Till 1", "JOE-CBD-1");
    let _ = store.insert_receipt_aged(terminal.id, "https://blob.test/older.pdf", TimeDelta::minutes(2));
    let _ = store.insert_receipt_aged(terminal.id, "https://blob.test/newer.pdf", TimeDelta::minutes(1));

    let first = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
    assert_eq!(first, ready("https://blob.test/newer.pdf"));

    // The older receipt is shadowed by the claimed newer one
    let second = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
    assert_eq!(second, LatestReceipt::Waiting);
}

#[tokio::test]
async fn test_same_instant_receipts_resolve_to_last_inserted() {
    let store = MemoryStore::new();
    let terminal = store.add_terminal("Till 1", "JOE-CBD-1");
    let _ = store.insert_receipt_aged(terminal.id, "https://blob.test/a.pdf", TimeDelta::zero());
    let _ = store.insert_receipt_aged(terminal.id, "https://blob.test/b.pdf", TimeDelta::zero());

    let answer = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
    assert_eq!(answer, ready("https://blob.test/b.pdf"));
}

#[tokio::test]
async fn test_receipts_of_other_terminals_are_ignored() {
    let store = MemoryStore::new();
    let _ = store.add_terminal("Till 1", "JOE-CBD-1");
    let other = store.add_terminal("Till 2", "JOE-CBD-2");
    let _ = store.insert_receipt_aged(other.id, URL, TimeDelta::zero());

    let answer = claim_latest_receipt(&store, Some("JOE-CBD-1")).await.unwrap();
    assert_eq!(answer, LatestReceipt::Waiting);
}

// =============================================================================
// Terminal Resolution
// =============================================================================

#[tokio::test]
async fn test_unknown_terminal_is_not_found() {
    let store = MemoryStore::new();
    let _ = store.add_terminal("Till 1", "JOE-CBD-1");

    let err = claim_latest_receipt(&store, Some("UNKNOWN")).await.unwrap_err();
    assert!(matches!(err, HandoffError::UnknownTerminal));
}

#[tokio::test]
async fn test_missing_terminal_id_is_bad_request() {
    let store = MemoryStore::new();

    let err = claim_latest_receipt(&store, None).await.unwrap_err();
    assert!(matches!(err, HandoffError::MissingTerminalId));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_polls_yield_exactly_one_ready() {
    let store = Arc::new(MemoryStore::new());
    let terminal = store.add_terminal("Till 1", "JOE-CBD-1");
    let _ = store.insert_receipt_aged(terminal.id, URL, TimeDelta::seconds(1));

    let polls: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { claim_latest_receipt(&*store, Some("JOE-CBD-1")).await })
        })
        .collect();

    let mut ready_count = 0;
    for poll in polls {
        match poll.await.unwrap().unwrap() {
            LatestReceipt::Ready { url } => {
                assert_eq!(url, URL);
                ready_count += 1;
            }
            LatestReceipt::Waiting => {}
        }
    }

    assert_eq!(ready_count, 1);
}
