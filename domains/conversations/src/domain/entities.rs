//! Domain entities for Conversations domain
//!
//! Conversations are two-party threads keyed by the derived pair id. Records
//! read back from a backend are re-validated before they are handed out; a
//! row that breaks the shape invariants is reported as an internal error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use thrift_common::{Error, Result};

use super::identity::{derive_id, ConversationId};

/// Maximum item title length (varchar(200))
pub const MAX_ITEM_TITLE_LENGTH: usize = 200;

/// Maximum message text length (CHECK length <= 4000)
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Maximum user id length (varchar(128))
pub const MAX_USER_ID_LENGTH: usize = 128;

/// Role of a user within one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    Buyer,
    Seller,
}

impl std::fmt::Display for ConversationRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationRole::Buyer => write!(f, "buyer"),
            ConversationRole::Seller => write!(f, "seller"),
        }
    }
}

/// Check a user id taken from a caller
pub fn validate_user_id(field: &str, user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    if user_id.chars().count() > MAX_USER_ID_LENGTH {
        return Err(Error::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_USER_ID_LENGTH
        )));
    }
    Ok(())
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: ConversationId,
    /// Both user ids, sorted
    pub participants: Vec<String>,
    /// Listing title captured when the conversation was opened or last re-contacted
    pub item_title: String,
    pub seller_id: String,
    pub buyer_id: String,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// Role of `user_id`: seller when they are the recorded seller, buyer otherwise
    pub fn role_of(&self, user_id: &str) -> Option<ConversationRole> {
        if !self.is_participant(user_id) {
            return None;
        }
        if self.seller_id == user_id {
            Some(ConversationRole::Seller)
        } else {
            Some(ConversationRole::Buyer)
        }
    }

    /// The participant that is not `user_id`
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        if !self.is_participant(user_id) {
            return None;
        }
        self.participants
            .iter()
            .find(|p| p.as_str() != user_id)
            .map(String::as_str)
    }

    pub fn ensure_participant(&self, user_id: &str) -> Result<()> {
        if self.is_participant(user_id) {
            Ok(())
        } else {
            Err(Error::Authorization(
                "Only the buyer and seller can access this conversation".to_string(),
            ))
        }
    }

    /// Check the shape invariants of a stored record
    pub fn validate(&self) -> Result<()> {
        let malformed =
            |reason: &str| Error::Internal(format!("Malformed conversation {}: {}", self.id, reason));

        let [first, second] = self.participants.as_slice() else {
            return Err(malformed("expected exactly two participants"));
        };
        if first == second {
            return Err(malformed("participants must be distinct"));
        }
        if self.buyer_id == self.seller_id
            || !self.is_participant(&self.buyer_id)
            || !self.is_participant(&self.seller_id)
        {
            return Err(malformed("buyer and seller must be the two participants"));
        }
        if derive_id(first, second) != self.id {
            return Err(malformed("id does not match participants"));
        }
        if self.item_title.trim().is_empty() {
            return Err(malformed("item title is empty"));
        }
        Ok(())
    }
}

/// What a contact action asks the store to create or merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationDraft {
    pub id: ConversationId,
    pub buyer_id: String,
    pub seller_id: String,
    pub item_title: String,
}

impl ConversationDraft {
    pub fn new(buyer_id: &str, seller_id: &str, item_title: &str) -> Result<Self> {
        validate_user_id("Buyer id", buyer_id)?;
        validate_user_id("Seller id", seller_id)?;
        if buyer_id == seller_id {
            return Err(Error::Validation(
                "Cannot start a conversation with yourself".to_string(),
            ));
        }

        let item_title = item_title.trim();
        if item_title.is_empty() {
            return Err(Error::Validation("Item title is required".to_string()));
        }
        if item_title.chars().count() > MAX_ITEM_TITLE_LENGTH {
            return Err(Error::Validation(format!(
                "Item title must be at most {} characters",
                MAX_ITEM_TITLE_LENGTH
            )));
        }

        Ok(Self {
            id: derive_id(buyer_id, seller_id),
            buyer_id: buyer_id.to_string(),
            seller_id: seller_id.to_string(),
            item_title: item_title.to_string(),
        })
    }

    /// Participant list in canonical (sorted) order
    pub fn participants(&self) -> Vec<String> {
        let mut participants = vec![self.buyer_id.clone(), self.seller_id.clone()];
        participants.sort();
        participants
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub sender_id: String,
    pub text: String,
    /// Insertion order assigned by the store; breaks `created_at` ties
    pub sequence: i64,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Position of this message in its conversation's history
    pub fn ordering_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.sequence)
    }

    /// Check the shape invariants of a stored record
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() || self.sender_id.is_empty() {
            return Err(Error::Internal(format!(
                "Malformed message {} in conversation {}",
                self.id, self.conversation_id
            )));
        }
        Ok(())
    }

    /// Message text must contain something other than whitespace
    pub fn validate_text(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Validation(
                "Message text cannot be empty or whitespace-only".to_string(),
            ));
        }
        if text.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(Error::Validation(format!(
                "Message text must be at most {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }
        Ok(())
    }
}

/// A message about to be appended. Timestamp and sequence come from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub sender_id: String,
    pub text: String,
}

impl NewMessage {
    pub fn new(conversation_id: ConversationId, sender_id: &str, text: &str) -> Result<Self> {
        validate_user_id("Sender id", sender_id)?;
        Message::validate_text(text)?;

        Ok(Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id: sender_id.to_string(),
            text: text.to_string(),
        })
    }
}

/// A conversation as seen by one of its participants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub role: ConversationRole,
}

impl ConversationSummary {
    /// Annotate `conversation` for `user_id`; `None` when they are not a participant
    pub fn for_user(conversation: Conversation, user_id: &str) -> Option<Self> {
        let role = conversation.role_of(user_id)?;
        Some(Self { conversation, role })
    }
}
