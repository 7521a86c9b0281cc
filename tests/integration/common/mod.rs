//! Common test utilities and fixtures for integration tests
//!
//! The application is assembled over the in-memory store and the mock object
//! storage, so every test gets a fresh, isolated marketplace.

use std::env;
use std::pin::Pin;
use std::sync::{Arc, Once};
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use serde_json::Value;
use thrift_app::{build_router, AppParts};
use thrift_auth::{AuthBackend, AuthConfig};
use thrift_conversations::ChatConfig;
use thrift_members::{CommunityGate, GateConfig};
use thrift_storage::mock::MockObjectStorage;
use tower::ServiceExt;

static INIT: Once = Once::new();

pub const TEST_QUESTIONS: &str = r#"[
    {"question": "What is the name of the campus mascot?", "answer": "Owl"},
    {"question": "Which building hosts the Sunday flea market?", "answer": "Old Library"}
]"#;

/// Test environment configuration
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub jwt_secret: String,
    pub issuer: Option<String>,
}

impl TestConfig {
    pub fn from_env() -> Self {
        INIT.call_once(|| {
            dotenvy::from_filename(".env.test").ok();
        });

        Self {
            jwt_secret: env::var("TEST_JWT_SECRET")
                .unwrap_or_else(|_| "test_secret_key_for_testing_only".to_string()),
            issuer: Some("thrift-test".to_string()),
        }
    }
}

/// Fully wired application over in-memory parts
pub struct TestApp {
    pub router: Router,
    pub storage: MockObjectStorage,
    pub config: TestConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_chat_config(ChatConfig::default())
    }

    pub fn with_chat_config(chat: ChatConfig) -> Self {
        let config = TestConfig::from_env();
        let storage = MockObjectStorage::new();
        let gate = CommunityGate::new(
            GateConfig::from_json(TEST_QUESTIONS).expect("test questions are valid"),
        );
        let auth = AuthBackend::new(AuthConfig {
            jwt_secret: config.jwt_secret.clone(),
            issuer: config.issuer.clone(),
            audience: None,
        });

        let parts = AppParts::in_memory(Arc::new(storage.clone()), gate, auth, chat);

        Self {
            router: build_router(parts),
            storage,
            config,
        }
    }

    /// Create a signed-in user
    pub fn user(&self, id: &str, name: &str) -> TestUser {
        TestUser {
            id: id.to_string(),
            name: name.to_string(),
            token: create_test_jwt(id, name, &self.config)
                .expect("test token encodes"),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Publish a listing through the multipart endpoint; returns the response body
    pub async fn publish_listing(
        &self,
        seller: &TestUser,
        title: &str,
        price: &str,
        category: &str,
    ) -> (axum::http::StatusCode, Value) {
        let form = MultipartForm::new()
            .text("title", title)
            .text("price", price)
            .text("category", category)
            .file("image", "jacket.jpg", "image/jpeg", b"\xff\xd8\xff\xe0 jpeg bytes");
        let response = self
            .send(form.into_request("/v1/listings", &seller.token))
            .await;
        let status = response.status();
        (status, parse_body(response).await)
    }

    /// Contact a listing's seller; returns the conversation id
    pub async fn contact(&self, buyer: &TestUser, listing_id: &str) -> String {
        let response = self
            .send(authed_request(
                Method::POST,
                &format!("/v1/listings/{}/contact", listing_id),
                &buyer.token,
                None,
            ))
            .await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        parse_body(response).await["conversation_id"]
            .as_str()
            .expect("conversation id in contact response")
            .to_string()
    }

    /// Post a message; returns the raw response
    pub async fn post_message(
        &self,
        sender: &TestUser,
        conversation_id: &str,
        text: &str,
    ) -> Response<Body> {
        self.send(authed_request(
            Method::POST,
            &format!("/v1/conversations/{}/messages", conversation_id),
            &sender.token,
            Some(serde_json::json!({ "text": text })),
        ))
        .await
    }

    pub async fn get_json(&self, user: &TestUser, uri: &str) -> (axum::http::StatusCode, Value) {
        let response = self
            .send(authed_request(Method::GET, uri, &user.token, None))
            .await;
        let status = response.status();
        (status, parse_body(response).await)
    }
}

/// Signed-in user fixture
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub name: String,
    pub token: String,
}

/// Create a test JWT for the identity provider's claim shape
pub fn create_test_jwt(user_id: &str, name: &str, config: &TestConfig) -> Result<String> {
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        name: &'a str,
        email: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<&'a str>,
        iat: u64,
        exp: u64,
    }

    let now = chrono::Utc::now().timestamp() as u64;
    let claims = TestClaims {
        sub: user_id,
        name,
        email: format!("{}@thrift.test", user_id),
        iss: config.issuer.as_deref(),
        iat: now,
        exp: now + 3600,
    };

    let header = Header::new(Algorithm::HS256);
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());

    Ok(jsonwebtoken::encode(&header, &claims, &encoding_key)?)
}

/// Build an authenticated request with an optional JSON body
pub fn authed_request(method: Method, uri: &str, jwt: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", jwt));

    match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Parse a response body as JSON; empty bodies become `Value::Null`
pub async fn parse_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).unwrap()
}

/// Hand-built multipart/form-data body
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("thrift-boundary-{}", uuid::Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str, jwt: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("authorization", format!("Bearer {}", jwt))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

/// Incremental reader for a server-sent event response
pub struct SseReader {
    stream: axum::body::BodyDataStream,
    buffer: String,
}

/// One parsed server-sent event
#[derive(Debug, Clone)]
pub struct SseEvent {
    pub event: String,
    pub data: Value,
}

impl SseReader {
    pub fn new(response: Response<Body>) -> Self {
        Self {
            stream: response.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }

    /// Next complete event, or `None` if the stream ended or stayed silent
    pub async fn next_event(&mut self, wait: Duration) -> Option<SseEvent> {
        loop {
            if let Some(event) = self.take_event() {
                return Some(event);
            }

            let chunk = tokio::time::timeout(
                wait,
                std::future::poll_fn(|cx| {
                    futures_core::Stream::poll_next(Pin::new(&mut self.stream), cx)
                }),
            )
            .await
            .ok()??
            .ok()?;
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    fn take_event(&mut self) -> Option<SseEvent> {
        loop {
            let end = self.buffer.find("\n\n")?;
            let raw: String = self.buffer.drain(..end + 2).collect();

            let mut event = String::from("message");
            let mut data = String::new();
            for line in raw.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    event = value.trim().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push_str(value.trim_start());
                }
            }

            // Comment-only frames (keep-alives) carry no data
            if data.is_empty() {
                continue;
            }
            return Some(SseEvent {
                event,
                data: serde_json::from_str(&data).unwrap_or(Value::String(data)),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        let config = TestConfig::from_env();
        assert!(!config.jwt_secret.is_empty());
    }

    #[test]
    fn test_jwt_creation() {
        let token = create_test_jwt("u1", "Ayesha", &TestConfig::from_env()).unwrap();
        assert_eq!(token.matches('.').count(), 2);
    }
}
