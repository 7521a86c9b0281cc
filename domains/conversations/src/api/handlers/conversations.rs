//! Conversation API handlers

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thrift_auth::AuthUser;
use thrift_common::{Error, Pagination, Result};
use uuid::Uuid;

use super::snapshot_events;
use crate::api::middleware::ConversationsState;
use crate::domain::entities::{ConversationRole, ConversationSummary};
use crate::domain::identity::ConversationId;

/// Conversation as listed for the requesting user
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: ConversationId,
    pub participants: Vec<String>,
    pub item_title: String,
    pub seller_id: String,
    pub buyer_id: String,
    pub role: ConversationRole,
    /// The other participant
    pub counterpart_id: Option<String>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ConversationResponse {
    fn for_viewer(summary: ConversationSummary, viewer_id: &str) -> Self {
        let counterpart_id = summary
            .conversation
            .counterpart_of(viewer_id)
            .map(str::to_string);
        let c = summary.conversation;
        Self {
            id: c.id,
            participants: c.participants,
            item_title: c.item_title,
            seller_id: c.seller_id,
            buyer_id: c.buyer_id,
            role: summary.role,
            counterpart_id,
            last_activity_at: c.last_activity_at,
            created_at: c.created_at,
        }
    }
}

fn render_list(summaries: Vec<ConversationSummary>, viewer_id: &str) -> Vec<ConversationResponse> {
    summaries
        .into_iter()
        .map(|s| ConversationResponse::for_viewer(s, viewer_id))
        .collect()
}

/// Response for the contact action
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub conversation_id: ConversationId,
}

/// Open (or reopen) the conversation with a listing's seller.
///
/// Sold listings are off the feed and cannot be asked about; threads that
/// already exist stay open for messaging.
pub async fn contact_seller(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<ContactResponse>> {
    let listing = state
        .listings
        .find(listing_id)
        .await?
        .ok_or_else(|| Error::NotFound("Listing not found".to_string()))?;

    if listing.is_sold() {
        return Err(Error::Validation(
            "This item has already been sold".to_string(),
        ));
    }

    if listing.seller_id == ctx.user_id {
        return Err(Error::Validation(
            "You cannot contact yourself about your own listing".to_string(),
        ));
    }

    let conversation_id = state
        .store
        .ensure_conversation(&ctx.user_id, &ctx.user_id, &listing.seller_id, &listing.title)
        .await?;

    Ok(Json(ContactResponse { conversation_id }))
}

/// List the caller's conversations, most recent activity first
pub async fn list_conversations(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<ConversationResponse>>> {
    let summaries = state.index.snapshot(&ctx.user_id).await?;
    Ok(Json(render_list(pagination.apply(summaries), &ctx.user_id)))
}

/// Live conversation list (SSE): one `snapshot` event per change
pub async fn stream_conversations(
    AuthUser(ctx): AuthUser,
    State(state): State<ConversationsState>,
) -> Result<
    Sse<impl futures_core::Stream<Item = std::result::Result<Event, std::convert::Infallible>>>,
> {
    let subscription = state.index.subscribe(&ctx.user_id)?;
    let viewer_id = ctx.user_id;

    Ok(
        Sse::new(snapshot_events(subscription, move |summaries| {
            render_list(summaries, &viewer_id)
        }))
        .keep_alive(KeepAlive::default()),
    )
}
