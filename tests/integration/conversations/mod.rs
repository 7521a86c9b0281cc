//! Conversations: contact, messaging and the per-user index

use axum::http::{Method, StatusCode};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use thrift_conversations::{ChatConfig, SnapshotPolicy};

use crate::common::{authed_request, parse_body, TestApp, TestUser};

fn timestamp(value: &Value) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value.as_str().unwrap()).unwrap()
}

/// u2 sells a Vintage Jacket; returns (app, buyer u1, seller u2, listing id)
async fn jacket_for_sale() -> (TestApp, TestUser, TestUser, String) {
    let app = TestApp::new();
    let buyer = app.user("u1", "Ayesha");
    let seller = app.user("u2", "Bilal");

    let (status, listing) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let listing_id = listing["id"].as_str().unwrap().to_string();

    (app, buyer, seller, listing_id)
}

#[tokio::test]
async fn test_vintage_jacket_scenario() {
    let (app, buyer, seller, listing_id) = jacket_for_sale().await;

    let conversation_id = app.contact(&buyer, &listing_id).await;
    assert_eq!(conversation_id, "u1_u2");

    let sent = app
        .post_message(&buyer, &conversation_id, "Is this still available?")
        .await;
    assert_eq!(sent.status(), StatusCode::CREATED);

    let (status, buyer_index) = app.get_json(&buyer, "/v1/conversations").await;
    assert_eq!(status, StatusCode::OK);
    let buyer_index = buyer_index.as_array().unwrap();
    assert_eq!(buyer_index.len(), 1);
    assert_eq!(buyer_index[0]["id"], "u1_u2");
    assert_eq!(buyer_index[0]["item_title"], "Vintage Jacket");
    assert_eq!(buyer_index[0]["role"], "buyer");
    assert_eq!(buyer_index[0]["counterpart_id"], "u2");

    let (_, seller_index) = app.get_json(&seller, "/v1/conversations").await;
    let seller_index = seller_index.as_array().unwrap();
    assert_eq!(seller_index.len(), 1);
    assert_eq!(seller_index[0]["item_title"], "Vintage Jacket");
    assert_eq!(seller_index[0]["role"], "seller");
    assert_eq!(seller_index[0]["counterpart_id"], "u1");

    let (_, history) = app
        .get_json(&seller, "/v1/conversations/u1_u2/messages")
        .await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["sender_id"], "u1");
    assert_eq!(history[0]["text"], "Is this still available?");
}

#[tokio::test]
async fn test_contact_is_idempotent() {
    let (app, buyer, seller, listing_id) = jacket_for_sale().await;

    let first = app.contact(&buyer, &listing_id).await;
    let second = app.contact(&buyer, &listing_id).await;
    assert_eq!(first, second);

    let (_, index) = app.get_json(&seller, "/v1/conversations").await;
    assert_eq!(index.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_contact_own_or_missing_listing() {
    let (app, _buyer, seller, listing_id) = jacket_for_sale().await;

    let own = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/listings/{}/contact", listing_id),
            &seller.token,
            None,
        ))
        .await;
    assert_eq!(own.status(), StatusCode::BAD_REQUEST);

    let missing = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/listings/{}/contact", uuid::Uuid::new_v4()),
            &seller.token,
            None,
        ))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sold_listing_cannot_be_contacted() {
    let (app, buyer, seller, listing_id) = jacket_for_sale().await;
    let conversation_id = app.contact(&buyer, &listing_id).await;

    let toggle = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/listings/{}/toggle-status", listing_id),
            &seller.token,
            None,
        ))
        .await;
    assert_eq!(toggle.status(), StatusCode::OK);

    let late_buyer = app.user("u3", "Sana");
    let response = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/listings/{}/contact", listing_id),
            &late_buyer.token,
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        parse_body(response).await["error"]["message"],
        "This item has already been sold"
    );

    let (_, index) = app.get_json(&late_buyer, "/v1/conversations").await;
    assert!(index.as_array().unwrap().is_empty());

    // The existing thread keeps working
    let reply = app
        .post_message(&seller, &conversation_id, "Sorry, it just sold")
        .await;
    assert_eq!(reply.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_outsider_is_denied() {
    let (app, buyer, _seller, listing_id) = jacket_for_sale().await;
    let outsider = app.user("u3", "Sana");
    let conversation_id = app.contact(&buyer, &listing_id).await;

    let response = app
        .post_message(&outsider, &conversation_id, "Can I buy it instead?")
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        parse_body(response).await["error"]["code"],
        "AUTHORIZATION_ERROR"
    );

    let (status, _) = app
        .get_json(&outsider, &format!("/v1/conversations/{}/messages", conversation_id))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, outsider_index) = app.get_json(&outsider, "/v1/conversations").await;
    assert!(outsider_index.as_array().unwrap().is_empty());

    let (_, history) = app
        .get_json(&buyer, &format!("/v1/conversations/{}/messages", conversation_id))
        .await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_text_rejected_without_record() {
    let (app, buyer, _seller, listing_id) = jacket_for_sale().await;
    let conversation_id = app.contact(&buyer, &listing_id).await;

    for text in ["", "   \n"] {
        let response = app.post_message(&buyer, &conversation_id, text).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{:?}", text);
        assert_eq!(
            parse_body(response).await["error"]["code"],
            "VALIDATION_ERROR"
        );
    }

    let (_, history) = app
        .get_json(&buyer, &format!("/v1/conversations/{}/messages", conversation_id))
        .await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_and_malformed_conversation_ids() {
    let (app, buyer, _seller, _listing_id) = jacket_for_sale().await;

    let unknown = app.post_message(&buyer, "u1_u9", "hello").await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let malformed = app.post_message(&buyer, "not-an-id", "hello").await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_messages_are_ordered_and_bump_activity() {
    let (app, buyer, seller, listing_id) = jacket_for_sale().await;
    let conversation_id = app.contact(&buyer, &listing_id).await;

    for (sender, text) in [
        (&buyer, "Is this still available?"),
        (&seller, "Yes, it is"),
        (&buyer, "Would you take 1200?"),
    ] {
        let response = app.post_message(sender, &conversation_id, text).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let (_, history) = app
        .get_json(&seller, &format!("/v1/conversations/{}/messages", conversation_id))
        .await;
    let history = history.as_array().unwrap();
    let texts: Vec<&str> = history.iter().map(|m| m["text"].as_str().unwrap()).collect();
    assert_eq!(
        texts,
        vec!["Is this still available?", "Yes, it is", "Would you take 1200?"]
    );
    assert!(history
        .windows(2)
        .all(|w| w[0]["sequence"].as_i64() < w[1]["sequence"].as_i64()));

    let newest = timestamp(&history[2]["created_at"]);
    let (_, index) = app.get_json(&buyer, "/v1/conversations").await;
    let activity = timestamp(&index[0]["last_activity_at"]);
    assert!(activity >= newest);
}

#[tokio::test]
async fn test_index_orders_by_recent_activity() {
    let (app, buyer, seller, jacket_id) = jacket_for_sale().await;
    let other_buyer = app.user("u3", "Sana");

    let (_, boots) = app
        .publish_listing(&seller, "Leather Boots", "900", "Shoes")
        .await;
    let with_u1 = app.contact(&buyer, &jacket_id).await;
    let with_u3 = app
        .contact(&other_buyer, boots["id"].as_str().unwrap())
        .await;

    let (_, index) = app.get_json(&seller, "/v1/conversations").await;
    let order: Vec<&str> = index
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec![with_u3.as_str(), with_u1.as_str()]);

    app.post_message(&buyer, &with_u1, "Still interested").await;

    let (_, index) = app.get_json(&seller, "/v1/conversations").await;
    assert_eq!(index[0]["id"], with_u1.as_str());
    assert_eq!(index[1]["id"], with_u3.as_str());
}

#[tokio::test]
async fn test_latest_contact_updates_item_title_by_default() {
    let (app, buyer, seller, jacket_id) = jacket_for_sale().await;
    let (_, boots) = app
        .publish_listing(&seller, "Leather Boots", "900", "Shoes")
        .await;

    let first = app.contact(&buyer, &jacket_id).await;
    let second = app.contact(&buyer, boots["id"].as_str().unwrap()).await;
    assert_eq!(first, second);

    let (_, index) = app.get_json(&buyer, "/v1/conversations").await;
    assert_eq!(index.as_array().unwrap().len(), 1);
    assert_eq!(index[0]["item_title"], "Leather Boots");
}

#[tokio::test]
async fn test_keep_first_policy_preserves_item_title() {
    let app = TestApp::with_chat_config(ChatConfig {
        snapshot_policy: SnapshotPolicy::KeepFirst,
        ..ChatConfig::default()
    });
    let buyer = app.user("u1", "Ayesha");
    let seller = app.user("u2", "Bilal");

    let (_, jacket) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;
    let (_, boots) = app
        .publish_listing(&seller, "Leather Boots", "900", "Shoes")
        .await;

    app.contact(&buyer, jacket["id"].as_str().unwrap()).await;
    app.contact(&buyer, boots["id"].as_str().unwrap()).await;

    let (_, index) = app.get_json(&seller, "/v1/conversations").await;
    assert_eq!(index[0]["item_title"], "Vintage Jacket");
}
