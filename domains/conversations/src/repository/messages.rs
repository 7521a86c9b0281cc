//! Postgres message repository

use async_trait::async_trait;
use sqlx::PgPool;

use thrift_common::{Error, Result};

use super::changes::{notify, ChangeEvent};
use super::MessageRepository;
use crate::domain::entities::{Message, NewMessage};
use crate::domain::identity::ConversationId;

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &NewMessage) -> Result<Message> {
        // clock_timestamp() rather than NOW() so messages written in one
        // transaction still get distinct, increasing timestamps
        let created = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, text, created_at)
            VALUES ($1, $2, $3, $4, clock_timestamp())
            RETURNING id, conversation_id, sender_id, text, sequence, created_at
            "#,
        )
        .bind(message.id)
        .bind(&message.conversation_id)
        .bind(&message.sender_id)
        .bind(&message.text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => Error::NotFound(
                format!("Conversation {} not found", message.conversation_id),
            ),
            other => Error::Database(other),
        })?;

        created.validate()?;

        notify(
            &self.pool,
            &ChangeEvent::Message {
                conversation_id: created.conversation_id.clone(),
            },
        )
        .await?;

        Ok(created)
    }

    async fn list_by_conversation(&self, conversation_id: &ConversationId) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, text, sequence, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, sequence ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        for message in &messages {
            message.validate()?;
        }
        Ok(messages)
    }
}
