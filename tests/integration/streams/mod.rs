//! Live views over server-sent events

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::Value;

use crate::common::{authed_request, SseEvent, SseReader, TestApp};

const WAIT: Duration = Duration::from_secs(2);

/// Read snapshots until one satisfies `accept`
async fn snapshot_where(reader: &mut SseReader, accept: impl Fn(&Value) -> bool) -> Value {
    loop {
        let SseEvent { event, data } = reader
            .next_event(WAIT)
            .await
            .expect("expected another snapshot");
        assert_eq!(event, "snapshot", "unexpected event: {}", data);
        if accept(&data) {
            return data;
        }
    }
}

fn len(value: &Value) -> usize {
    value.as_array().map(Vec::len).unwrap_or(0)
}

#[tokio::test]
async fn test_message_stream_delivers_full_history_on_each_append() {
    let app = TestApp::new();
    let buyer = app.user("u1", "Ayesha");
    let seller = app.user("u2", "Bilal");
    let (_, listing) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;
    let conversation_id = app.contact(&buyer, listing["id"].as_str().unwrap()).await;

    let response = app
        .send(authed_request(
            Method::GET,
            &format!("/v1/conversations/{}/messages/stream", conversation_id),
            &seller.token,
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut reader = SseReader::new(response);

    let initial = snapshot_where(&mut reader, |_| true).await;
    assert_eq!(len(&initial), 0);

    app.post_message(&buyer, &conversation_id, "Is this still available?")
        .await;
    let one = snapshot_where(&mut reader, |s| len(s) == 1).await;
    assert_eq!(one[0]["text"], "Is this still available?");

    app.post_message(&seller, &conversation_id, "Yes, it is").await;
    let two = snapshot_where(&mut reader, |s| len(s) == 2).await;
    assert_eq!(two[0]["text"], "Is this still available?");
    assert_eq!(two[1]["text"], "Yes, it is");
}

#[tokio::test]
async fn test_index_stream_follows_new_conversations() {
    let app = TestApp::new();
    let buyer = app.user("u1", "Ayesha");
    let seller = app.user("u2", "Bilal");
    let (_, listing) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;

    let response = app
        .send(authed_request(
            Method::GET,
            "/v1/conversations/stream",
            &seller.token,
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut reader = SseReader::new(response);

    assert_eq!(len(&snapshot_where(&mut reader, |_| true).await), 0);

    app.contact(&buyer, listing["id"].as_str().unwrap()).await;
    let index = snapshot_where(&mut reader, |s| len(s) == 1).await;
    assert_eq!(index[0]["item_title"], "Vintage Jacket");
    assert_eq!(index[0]["role"], "seller");
}

#[tokio::test]
async fn test_outsider_cannot_open_message_stream() {
    let app = TestApp::new();
    let buyer = app.user("u1", "Ayesha");
    let seller = app.user("u2", "Bilal");
    let outsider = app.user("u3", "Sana");
    let (_, listing) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;
    let conversation_id = app.contact(&buyer, listing["id"].as_str().unwrap()).await;

    let response = app
        .send(authed_request(
            Method::GET,
            &format!("/v1/conversations/{}/messages/stream", conversation_id),
            &outsider.token,
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
