//! Per-user conversation list, most recent activity first

use std::sync::Arc;

use thrift_common::Result;

use crate::config::ChatConfig;
use crate::domain::entities::{validate_user_id, Conversation, ConversationSummary};
use crate::repository::{ChangeFeed, ConversationRepository};
use crate::subscription::{watch, Subscription};

#[derive(Clone)]
pub struct ConversationIndex {
    conversations: Arc<dyn ConversationRepository>,
    changes: ChangeFeed,
    subscription_buffer: usize,
}

/// Attach `user_id`'s role to each conversation, keeping order
pub fn annotate(user_id: &str, conversations: Vec<Conversation>) -> Vec<ConversationSummary> {
    conversations
        .into_iter()
        .filter_map(|c| ConversationSummary::for_user(c, user_id))
        .collect()
}

impl ConversationIndex {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        changes: ChangeFeed,
        config: &ChatConfig,
    ) -> Self {
        Self {
            conversations,
            changes,
            subscription_buffer: config.subscription_buffer,
        }
    }

    pub async fn snapshot(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        validate_user_id("User id", user_id)?;
        let conversations = self.conversations.list_for_participant(user_id).await?;
        Ok(annotate(user_id, conversations))
    }

    /// The user's conversation list now and after every change to any of them
    pub fn subscribe(&self, user_id: &str) -> Result<Subscription<Vec<ConversationSummary>>> {
        validate_user_id("User id", user_id)?;

        let watched = user_id.to_string();
        let loaded = user_id.to_string();
        let conversations = self.conversations.clone();

        Ok(watch(
            &self.changes,
            self.subscription_buffer,
            format!("index:{}", user_id),
            move |event| event.affects_index_of(&watched),
            move || {
                let conversations = conversations.clone();
                let user_id = loaded.clone();
                async move {
                    let list = conversations.list_for_participant(&user_id).await?;
                    Ok(annotate(&user_id, list))
                }
            },
        ))
    }
}
