//! Postgres conversation repository

use async_trait::async_trait;
use sqlx::PgPool;

use thrift_common::Result;

use super::changes::{notify, ChangeEvent};
use super::ConversationRepository;
use crate::config::SnapshotPolicy;
use crate::domain::entities::{Conversation, ConversationDraft};
use crate::domain::identity::ConversationId;

#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn announce(&self, conversation: &Conversation) -> Result<()> {
        notify(
            &self.pool,
            &ChangeEvent::Conversation {
                conversation_id: conversation.id.clone(),
                participants: conversation.participants.clone(),
            },
        )
        .await
    }
}

fn checked(conversation: Conversation) -> Result<Conversation> {
    conversation.validate()?;
    Ok(conversation)
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn upsert(
        &self,
        draft: &ConversationDraft,
        policy: SnapshotPolicy,
    ) -> Result<Conversation> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (
                id, participants, item_title, seller_id, buyer_id,
                last_activity_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE SET
                item_title = CASE WHEN $6 THEN EXCLUDED.item_title ELSE conversations.item_title END,
                seller_id = CASE WHEN $6 THEN EXCLUDED.seller_id ELSE conversations.seller_id END,
                buyer_id = CASE WHEN $6 THEN EXCLUDED.buyer_id ELSE conversations.buyer_id END,
                last_activity_at = GREATEST(conversations.last_activity_at, NOW())
            RETURNING id, participants, item_title, seller_id, buyer_id,
                      last_activity_at, created_at
            "#,
        )
        .bind(&draft.id)
        .bind(draft.participants())
        .bind(&draft.item_title)
        .bind(&draft.seller_id)
        .bind(&draft.buyer_id)
        .bind(policy == SnapshotPolicy::LastContactWins)
        .fetch_one(&self.pool)
        .await?;

        let conversation = checked(conversation)?;
        self.announce(&conversation).await?;
        Ok(conversation)
    }

    async fn find(&self, id: &ConversationId) -> Result<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, participants, item_title, seller_id, buyer_id,
                   last_activity_at, created_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        conversation.map(checked).transpose()
    }

    async fn touch_activity(&self, id: &ConversationId) -> Result<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            UPDATE conversations SET
                last_activity_at = GREATEST(
                    last_activity_at,
                    NOW(),
                    (SELECT MAX(created_at) FROM messages WHERE conversation_id = $1)
                )
            WHERE id = $1
            RETURNING id, participants, item_title, seller_id, buyer_id,
                      last_activity_at, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(conversation) = conversation.map(checked).transpose()? else {
            return Ok(None);
        };
        self.announce(&conversation).await?;
        Ok(Some(conversation))
    }

    async fn list_for_participant(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let conversations = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, participants, item_title, seller_id, buyer_id,
                   last_activity_at, created_at
            FROM conversations
            WHERE participants @> ARRAY[$1]::TEXT[]
            ORDER BY last_activity_at DESC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        conversations.into_iter().map(checked).collect()
    }
}
