//! Listing catalog: publishing, feed filtering and seller-only mutations

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::common::{authed_request, parse_body, MultipartForm, TestApp};

fn ids(listings: &Value) -> Vec<String> {
    listings
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_publish_listing_stores_image_and_record() {
    let app = TestApp::new();
    let seller = app.user("u2", "Bilal");

    let (status, listing) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(listing["title"], "Vintage Jacket");
    assert_eq!(listing["price"], 1500);
    assert_eq!(listing["category"], "Outerwear");
    assert_eq!(listing["status"], "available");
    assert_eq!(listing["seller_id"], "u2");
    assert_eq!(listing["seller_name"], "Bilal");

    let url = listing["image_url"].as_str().unwrap();
    assert!(url.starts_with("https://mock-storage.local/"));
    assert!(url.ends_with("_jacket.jpg"));
    assert_eq!(app.storage.object_count(), 1);
}

#[tokio::test]
async fn test_non_numeric_price_rejected_before_upload() {
    let app = TestApp::new();
    let seller = app.user("u2", "Bilal");

    for price in ["abc", "0", "-5", "12.50"] {
        let (status, body) = app
            .publish_listing(&seller, "Vintage Jacket", price, "Outerwear")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {}", price);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
    assert_eq!(app.storage.object_count(), 0);
}

#[tokio::test]
async fn test_image_must_be_an_image() {
    let app = TestApp::new();
    let seller = app.user("u2", "Bilal");

    let form = MultipartForm::new()
        .text("title", "Boots")
        .text("price", "900")
        .text("category", "Shoes")
        .file("image", "notes.txt", "text/plain", b"not an image");
    let response = app.send(form.into_request("/v1/listings", &seller.token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let form = MultipartForm::new()
        .text("title", "Boots")
        .text("price", "900")
        .text("category", "Shoes");
    let response = app.send(form.into_request("/v1/listings", &seller.token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_upload_writes_no_listing() {
    let app = TestApp::new();
    let seller = app.user("u2", "Bilal");
    app.storage.fail_uploads("bucket unreachable");

    let (status, body) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "STORAGE_ERROR");

    let (_, mine) = app.get_json(&seller, "/v1/listings/mine").await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_feed_hides_sold_and_filters() {
    let app = TestApp::new();
    let seller = app.user("u2", "Bilal");
    let buyer = app.user("u1", "Ayesha");

    let (_, jacket) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;
    let (_, boots) = app
        .publish_listing(&seller, "Leather Boots", "900", "Shoes")
        .await;
    let (_, coat) = app
        .publish_listing(&seller, "Wool Coat", "2500", "Outerwear")
        .await;

    let toggle = app
        .send(authed_request(
            Method::POST,
            &format!("/v1/listings/{}/toggle-status", coat["id"].as_str().unwrap()),
            &seller.token,
            None,
        ))
        .await;
    assert_eq!(toggle.status(), StatusCode::OK);
    assert_eq!(parse_body(toggle).await["status"], "sold");

    let (status, feed) = app.get_json(&buyer, "/v1/listings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&feed),
        vec![
            boots["id"].as_str().unwrap().to_string(),
            jacket["id"].as_str().unwrap().to_string(),
        ]
    );

    let (_, outerwear) = app.get_json(&buyer, "/v1/listings?category=outerwear").await;
    assert_eq!(ids(&outerwear), vec![jacket["id"].as_str().unwrap().to_string()]);

    let (_, all) = app.get_json(&buyer, "/v1/listings?category=All&q=LEATHER").await;
    assert_eq!(ids(&all), vec![boots["id"].as_str().unwrap().to_string()]);

    let (status, _) = app.get_json(&buyer, "/v1/listings?category=Hats").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The seller still sees sold items among their own
    let (_, mine) = app.get_json(&seller, "/v1/listings/mine").await;
    assert_eq!(mine.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_only_the_seller_can_mutate() {
    let app = TestApp::new();
    let seller = app.user("u2", "Bilal");
    let other = app.user("u3", "Sana");

    let (_, listing) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;
    let uri = format!("/v1/listings/{}", listing["id"].as_str().unwrap());

    let edit = app
        .send(authed_request(
            Method::PATCH,
            &uri,
            &other.token,
            Some(json!({ "price": 1 })),
        ))
        .await;
    assert_eq!(edit.status(), StatusCode::FORBIDDEN);

    let toggle = app
        .send(authed_request(
            Method::POST,
            &format!("{}/toggle-status", uri),
            &other.token,
            None,
        ))
        .await;
    assert_eq!(toggle.status(), StatusCode::FORBIDDEN);

    let delete = app
        .send(authed_request(Method::DELETE, &uri, &other.token, None))
        .await;
    assert_eq!(delete.status(), StatusCode::FORBIDDEN);

    let (status, unchanged) = app.get_json(&other, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["price"], 1500);
}

#[tokio::test]
async fn test_seller_edits_and_deletes() {
    let app = TestApp::new();
    let seller = app.user("u2", "Bilal");

    let (_, listing) = app
        .publish_listing(&seller, "Vintage Jacket", "1500", "Outerwear")
        .await;
    let uri = format!("/v1/listings/{}", listing["id"].as_str().unwrap());

    let edit = app
        .send(authed_request(
            Method::PATCH,
            &uri,
            &seller.token,
            Some(json!({ "title": "Vintage Denim Jacket", "price": 1200 })),
        ))
        .await;
    assert_eq!(edit.status(), StatusCode::OK);
    let edited = parse_body(edit).await;
    assert_eq!(edited["title"], "Vintage Denim Jacket");
    assert_eq!(edited["price"], 1200);

    let bad = app
        .send(authed_request(
            Method::PATCH,
            &uri,
            &seller.token,
            Some(json!({ "price": 0 })),
        ))
        .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let delete = app
        .send(authed_request(Method::DELETE, &uri, &seller.token, None))
        .await;
    assert_eq!(delete.status(), StatusCode::NO_CONTENT);

    let (status, _) = app.get_json(&seller, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
