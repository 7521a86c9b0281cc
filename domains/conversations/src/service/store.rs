//! Conversation records: create on first contact, merge on repeat contact,
//! bump activity on every message

use std::sync::Arc;

use thrift_common::{Error, Result};

use crate::config::SnapshotPolicy;
use crate::domain::entities::{Conversation, ConversationDraft};
use crate::domain::identity::ConversationId;
use crate::repository::ConversationRepository;

#[derive(Clone)]
pub struct ConversationStore {
    conversations: Arc<dyn ConversationRepository>,
    snapshot_policy: SnapshotPolicy,
}

impl ConversationStore {
    pub fn new(conversations: Arc<dyn ConversationRepository>, snapshot_policy: SnapshotPolicy) -> Self {
        Self {
            conversations,
            snapshot_policy,
        }
    }

    /// Open (or reopen) the conversation between `buyer_id` and `seller_id`
    /// about a listing titled `listing_title`.
    ///
    /// Idempotent per pair: repeated calls return the same id and never
    /// create a second record. `actor_id` must be one of the two parties.
    pub async fn ensure_conversation(
        &self,
        actor_id: &str,
        buyer_id: &str,
        seller_id: &str,
        listing_title: &str,
    ) -> Result<ConversationId> {
        let draft = ConversationDraft::new(buyer_id, seller_id, listing_title)?;
        if actor_id != buyer_id && actor_id != seller_id {
            return Err(Error::Authorization(
                "Only the buyer or the seller can open this conversation".to_string(),
            ));
        }

        let conversation = self
            .conversations
            .upsert(&draft, self.snapshot_policy)
            .await?;

        tracing::info!(
            conversation_id = %conversation.id,
            buyer_id = %draft.buyer_id,
            seller_id = %draft.seller_id,
            "Conversation ensured"
        );

        Ok(conversation.id)
    }

    /// Raise the conversation's last activity to now
    pub async fn touch_activity(&self, actor_id: &str, conversation_id: &ConversationId) -> Result<()> {
        self.find_for_participant(actor_id, conversation_id).await?;
        self.conversations
            .touch_activity(conversation_id)
            .await?
            .ok_or_else(|| not_found(conversation_id))?;
        Ok(())
    }

    /// Load a conversation `actor_id` takes part in
    pub async fn find_for_participant(
        &self,
        actor_id: &str,
        conversation_id: &ConversationId,
    ) -> Result<Conversation> {
        let conversation = self
            .conversations
            .find(conversation_id)
            .await?
            .ok_or_else(|| not_found(conversation_id))?;
        conversation.ensure_participant(actor_id)?;
        Ok(conversation)
    }
}

fn not_found(conversation_id: &ConversationId) -> Error {
    Error::NotFound(format!("Conversation {} not found", conversation_id))
}
