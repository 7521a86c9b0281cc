//! Per-conversation message history: append, snapshot, live view

use std::sync::Arc;

use uuid::Uuid;

use thrift_common::Result;

use crate::config::ChatConfig;
use crate::domain::entities::{Message, NewMessage};
use crate::domain::identity::ConversationId;
use crate::repository::{ChangeFeed, MessageRepository};
use crate::subscription::{watch, Subscription};

use super::store::ConversationStore;

#[derive(Clone)]
pub struct MessageStream {
    store: ConversationStore,
    messages: Arc<dyn MessageRepository>,
    changes: ChangeFeed,
    subscription_buffer: usize,
}

impl MessageStream {
    pub fn new(
        store: ConversationStore,
        messages: Arc<dyn MessageRepository>,
        changes: ChangeFeed,
        config: &ChatConfig,
    ) -> Self {
        Self {
            store,
            messages,
            changes,
            subscription_buffer: config.subscription_buffer,
        }
    }

    /// Append `text` from `sender_id` and bump the conversation's activity.
    ///
    /// The insert and the activity bump are two writes. If the bump fails
    /// the message stays stored, the conversation keeps its old activity
    /// time and the failure is returned.
    pub async fn append(
        &self,
        sender_id: &str,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<Uuid> {
        let new_message = NewMessage::new(conversation_id.clone(), sender_id, text)?;
        self.store
            .find_for_participant(sender_id, conversation_id)
            .await?;

        let message = self.messages.create(&new_message).await?;

        if let Err(e) = self.store.touch_activity(sender_id, conversation_id).await {
            tracing::warn!(
                conversation_id = %conversation_id,
                message_id = %message.id,
                error = %e,
                "Message stored but conversation activity was not updated"
            );
            return Err(e);
        }

        tracing::debug!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            sequence = message.sequence,
            "Message appended"
        );

        Ok(message.id)
    }

    /// Current ordered history
    pub async fn snapshot(&self, viewer_id: &str, conversation_id: &ConversationId) -> Result<Vec<Message>> {
        self.store
            .find_for_participant(viewer_id, conversation_id)
            .await?;
        self.messages.list_by_conversation(conversation_id).await
    }

    /// Ordered history now and after every append to this conversation
    pub async fn subscribe(
        &self,
        viewer_id: &str,
        conversation_id: &ConversationId,
    ) -> Result<Subscription<Vec<Message>>> {
        self.store
            .find_for_participant(viewer_id, conversation_id)
            .await?;

        let watched = conversation_id.clone();
        let loaded = conversation_id.clone();
        let messages = self.messages.clone();

        Ok(watch(
            &self.changes,
            self.subscription_buffer,
            format!("messages:{}", conversation_id),
            move |event| event.affects_messages_of(&watched),
            move || {
                let messages = messages.clone();
                let conversation_id = loaded.clone();
                async move { messages.list_by_conversation(&conversation_id).await }
            },
        ))
    }
}
