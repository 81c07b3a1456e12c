//! Integration tests for the stream consumer: arbitrary chunking, clean and
//! broken termination, and the exactly-once streaming-flag guarantee.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use futures_util::stream;
use raglink_client::{consume, StreamUpdate};
use tokio::sync::mpsc;

type Chunk = Result<Vec<u8>, std::io::Error>;

fn ok(bytes: &str) -> Chunk {
    Ok(bytes.as_bytes().to_vec())
}

fn read_error() -> Chunk {
    Err(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    ))
}

async fn drive(chunks: Vec<Chunk>) -> (raglink_client::StreamOutcome, Vec<StreamUpdate>) {
    let (tx, mut rx) = mpsc::channel(256);
    let outcome = consume(stream::iter(chunks), tx).await;

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    (outcome, updates)
}

#[tokio::test]
async fn clean_stream_builds_message_and_terminal() {
    let (outcome, updates) = drive(vec![
        ok("event: content\ndata: {\"content\":\"a\"}\n\n"),
        ok("event: content\ndata: {\"content\":\"b\"}\n\n"),
        ok("event: complete\ndata: {\"query\":\"q\",\"response\":\"ab\"}\n\n"),
    ])
    .await;

    assert_eq!(outcome.message.content, "ab");
    assert!(!outcome.message.streaming);
    assert!(outcome.failure.is_none());
    assert!(outcome.is_complete());
    assert_eq!(outcome.terminal.as_ref().unwrap().response, "ab");
    assert_eq!(outcome.events.len(), 3);

    assert!(matches!(&updates[0], StreamUpdate::Delta { text } if text == "a"));
    assert!(matches!(&updates[1], StreamUpdate::Delta { text } if text == "b"));
    assert!(matches!(&updates[2], StreamUpdate::Completed { .. }));
}

#[tokio::test]
async fn chunks_may_split_events_anywhere() {
    let (outcome, _) = drive(vec![
        ok("event: cont"),
        ok("ent\ndata: {\"content\":\"a\"}\n"),
        ok("\ndata: {\"cont"),
        ok("ent\":\"b\"}\n\n"),
    ])
    .await;

    assert_eq!(outcome.message.content, "ab");
    assert_eq!(outcome.events.len(), 2);
}

#[tokio::test]
async fn plain_text_data_is_appended_verbatim() {
    let (outcome, _) = drive(vec![ok("data: hello\n\n")]).await;
    assert_eq!(outcome.message.content, "hello");
}

#[tokio::test]
async fn dataless_blocks_have_no_effect() {
    let (outcome, updates) = drive(vec![ok("event: ping\n\n"), ok(": heartbeat\n\n")]).await;
    assert!(outcome.events.is_empty());
    assert!(updates.is_empty());
    assert!(outcome.message.content.is_empty());
}

#[tokio::test]
async fn read_error_clears_flag_and_reports_failure() {
    let (outcome, updates) = drive(vec![
        ok("data: {\"content\":\"partial\"}\n\n"),
        read_error(),
    ])
    .await;

    // Accumulated content survives the failure.
    assert_eq!(outcome.message.content, "partial");
    assert!(!outcome.message.streaming);
    assert!(outcome.failure.is_some());
    assert!(!outcome.is_complete());
    assert!(outcome.terminal.is_none());

    assert!(matches!(
        updates.last(),
        Some(StreamUpdate::Error { message }) if message.contains("connection reset")
    ));
}

#[tokio::test]
async fn read_error_does_not_overwrite_terminal() {
    let (outcome, _) = drive(vec![
        ok("event: complete\ndata: {\"query\":\"q\",\"response\":\"r\"}\n\n"),
        read_error(),
    ])
    .await;

    // The captured terminal result stays; only the failure is recorded.
    assert_eq!(outcome.terminal.unwrap().response, "r");
    assert!(outcome.failure.is_some());
    assert!(!outcome.message.streaming);
}

#[tokio::test]
async fn clean_end_without_terminal_is_incomplete() {
    let (outcome, _) = drive(vec![ok("data: {\"content\":\"text\"}\n\n")]).await;
    assert!(outcome.failure.is_none());
    assert!(!outcome.is_complete());
}
