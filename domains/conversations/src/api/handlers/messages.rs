//! Message API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thrift_auth::AuthUser;
use thrift_common::{Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use super::snapshot_events;
use crate::api::middleware::ConversationsState;
use crate::domain::entities::Message;
use crate::domain::identity::ConversationId;

/// Request for sending a message
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000))]
    pub text: String,
}

/// Message response DTO
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub sender_id: String,
    pub text: String,
    pub sequence: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            text: m.text,
            sequence: m.sequence,
            created_at: m.created_at,
        }
    }
}

fn render_history(messages: Vec<Message>) -> Vec<MessageResponse> {
    messages.into_iter().map(MessageResponse::from).collect()
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub id: Uuid,
    pub conversation_id: ConversationId,
}

/// Append a message to a conversation
pub async fn send_message(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(conversation_id): Path<String>,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>)> {
    let conversation_id = ConversationId::parse(&conversation_id)?;

    let id = state
        .stream
        .append(&ctx.user_id, &conversation_id, &req.text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            id,
            conversation_id,
        }),
    ))
}

/// Full ordered history of a conversation
pub async fn list_messages(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>> {
    let conversation_id = ConversationId::parse(&conversation_id)?;
    let messages = state.stream.snapshot(&ctx.user_id, &conversation_id).await?;
    Ok(Json(render_history(messages)))
}

/// Live history (SSE): the whole ordered history after every append
pub async fn stream_messages(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(conversation_id): Path<String>,
) -> Result<
    Sse<impl futures_core::Stream<Item = std::result::Result<Event, std::convert::Infallible>>>,
> {
    let conversation_id = ConversationId::parse(&conversation_id)?;
    let subscription = state
        .stream
        .subscribe(&ctx.user_id, &conversation_id)
        .await?;

    Ok(Sse::new(snapshot_events(subscription, render_history)).keep_alive(KeepAlive::default()))
}
