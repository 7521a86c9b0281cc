//! Community gate and member registration

use axum::http::{Method, Request, StatusCode};
use axum::body::Body;
use serde_json::json;

use crate::common::{authed_request, parse_body, TestApp};

#[tokio::test]
async fn test_questions_are_public_and_hide_answers() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::get("/v1/community/questions")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_body(response).await;
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0], "What is the name of the campus mascot?");
    assert!(!body.to_string().contains("Old Library"));
}

#[tokio::test]
async fn test_register_with_loose_answers_succeeds() {
    let app = TestApp::new();
    let user = app.user("u1", "Ayesha");

    let response = app
        .send(authed_request(
            Method::POST,
            "/v1/members/register",
            &user.token,
            Some(json!({ "name": "Ayesha", "answers": ["  owl ", "OLD LIBRARY"] })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = parse_body(response).await;
    assert_eq!(body["user_id"], "u1");
    assert_eq!(body["community_verified"], true);
    assert_eq!(body["email"], "u1@thrift.test");

    let (status, me) = app.get_json(&user, "/v1/members/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Ayesha");
}

#[tokio::test]
async fn test_wrong_answers_are_denied() {
    let app = TestApp::new();
    let user = app.user("u1", "Ayesha");

    let response = app
        .send(authed_request(
            Method::POST,
            "/v1/members/register",
            &user.token,
            Some(json!({ "name": "Ayesha", "answers": ["Eagle", "Old Library"] })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = parse_body(response).await;
    assert_eq!(body["error"]["code"], "AUTHORIZATION_ERROR");
    assert_eq!(
        body["error"]["message"],
        "Access Denied: Your answers do not match our community records."
    );

    let (status, _) = app.get_json(&user, "/v1/members/me").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_answer_is_a_validation_error() {
    let app = TestApp::new();
    let user = app.user("u1", "Ayesha");

    let response = app
        .send(authed_request(
            Method::POST,
            "/v1/members/register",
            &user.token,
            Some(json!({ "name": "Ayesha", "answers": ["Owl"] })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_second_registration_conflicts() {
    let app = TestApp::new();
    let user = app.user("u1", "Ayesha");
    let register = || {
        authed_request(
            Method::POST,
            "/v1/members/register",
            &user.token,
            Some(json!({ "name": "Ayesha", "answers": ["Owl", "Old Library"] })),
        )
    };

    assert_eq!(app.send(register()).await.status(), StatusCode::CREATED);
    let second = app.send(register()).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_requires_authentication() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::post("/v1/members/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "name": "Ayesha", "answers": ["Owl", "Old Library"] }).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
