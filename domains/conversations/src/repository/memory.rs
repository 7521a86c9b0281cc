//! In-memory conversation and message store
//!
//! Used by tests and local development (`STORE_BACKEND=memory`). Behaves like
//! the Postgres repositories: server-side timestamps from the injected clock,
//! a global insertion counter for message sequence, and a change event after
//! every write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use thrift_common::{Clock, Error, Result, SystemClock};

use super::changes::{ChangeEvent, ChangeFeed};
use super::{ConversationRepository, MessageRepository};
use crate::config::SnapshotPolicy;
use crate::domain::entities::{Conversation, ConversationDraft, Message, NewMessage};
use crate::domain::identity::ConversationId;

#[derive(Default)]
struct MemoryState {
    conversations: HashMap<ConversationId, Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
    next_sequence: i64,
    failures: FailureInjection,
}

#[derive(Default)]
struct FailureInjection {
    writes: Option<String>,
    reads: Option<String>,
    touches: Option<String>,
}

/// Shared in-memory backend implementing both repository traits
#[derive(Clone)]
pub struct InMemoryChatStore {
    state: Arc<Mutex<MemoryState>>,
    clock: Arc<dyn Clock>,
    changes: ChangeFeed,
}

impl InMemoryChatStore {
    pub fn new(changes: ChangeFeed) -> Self {
        Self::with_clock(changes, Arc::new(SystemClock))
    }

    pub fn with_clock(changes: ChangeFeed, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            clock,
            changes,
        }
    }

    /// Fail every following write (upsert, touch, message insert) as a remote failure
    pub fn fail_writes(&self, message: Option<&str>) {
        self.state().failures.writes = message.map(str::to_string);
    }

    /// Fail every following read as a remote failure
    pub fn fail_reads(&self, message: Option<&str>) {
        self.state().failures.reads = message.map(str::to_string);
    }

    /// Fail only activity bumps
    pub fn fail_touches(&self, message: Option<&str>) {
        self.state().failures.touches = message.map(str::to_string);
    }

    /// Store a record as-is, bypassing validation (for corrupt-record tests)
    pub fn insert_raw(&self, conversation: Conversation) {
        self.state()
            .conversations
            .insert(conversation.id.clone(), conversation);
    }

    /// Feed this store publishes to
    pub fn changes(&self) -> ChangeFeed {
        self.changes.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn conversation_changed(&self, conversation: &Conversation) {
        self.changes.publish(ChangeEvent::Conversation {
            conversation_id: conversation.id.clone(),
            participants: conversation.participants.clone(),
        });
    }
}

fn injected(failure: &Option<String>) -> Result<()> {
    match failure {
        Some(message) => Err(Error::Remote(message.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl ConversationRepository for InMemoryChatStore {
    async fn upsert(
        &self,
        draft: &ConversationDraft,
        policy: SnapshotPolicy,
    ) -> Result<Conversation> {
        let now = self.clock.now();
        let conversation = {
            let mut state = self.state();
            injected(&state.failures.writes)?;

            let conversation = state
                .conversations
                .entry(draft.id.clone())
                .and_modify(|existing| {
                    if policy == SnapshotPolicy::LastContactWins {
                        existing.item_title = draft.item_title.clone();
                        existing.seller_id = draft.seller_id.clone();
                        existing.buyer_id = draft.buyer_id.clone();
                    }
                    existing.last_activity_at = existing.last_activity_at.max(now);
                })
                .or_insert_with(|| Conversation {
                    id: draft.id.clone(),
                    participants: draft.participants(),
                    item_title: draft.item_title.clone(),
                    seller_id: draft.seller_id.clone(),
                    buyer_id: draft.buyer_id.clone(),
                    last_activity_at: now,
                    created_at: now,
                })
                .clone();
            conversation.validate()?;
            conversation
        };

        self.conversation_changed(&conversation);
        Ok(conversation)
    }

    async fn find(&self, id: &ConversationId) -> Result<Option<Conversation>> {
        let state = self.state();
        injected(&state.failures.reads)?;

        state
            .conversations
            .get(id)
            .cloned()
            .map(|conversation| {
                conversation.validate()?;
                Ok(conversation)
            })
            .transpose()
    }

    async fn touch_activity(&self, id: &ConversationId) -> Result<Option<Conversation>> {
        let now = self.clock.now();
        let conversation = {
            let mut state = self.state();
            injected(&state.failures.writes)?;
            injected(&state.failures.touches)?;

            let newest_message = state
                .messages
                .get(id)
                .and_then(|messages| messages.iter().map(|m| m.created_at).max());

            let Some(conversation) = state.conversations.get_mut(id) else {
                return Ok(None);
            };
            conversation.last_activity_at = conversation
                .last_activity_at
                .max(now)
                .max(newest_message.unwrap_or(now));
            conversation.validate()?;
            conversation.clone()
        };

        self.conversation_changed(&conversation);
        Ok(Some(conversation))
    }

    async fn list_for_participant(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let mut conversations = {
            let state = self.state();
            injected(&state.failures.reads)?;

            state
                .conversations
                .values()
                .filter(|c| c.is_participant(user_id))
                .cloned()
                .collect::<Vec<_>>()
        };

        for conversation in &conversations {
            conversation.validate()?;
        }

        conversations.sort_by(|a, b| {
            b.last_activity_at
                .cmp(&a.last_activity_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(conversations)
    }
}

#[async_trait]
impl MessageRepository for InMemoryChatStore {
    async fn create(&self, message: &NewMessage) -> Result<Message> {
        let now = self.clock.now();
        let created = {
            let mut state = self.state();
            injected(&state.failures.writes)?;

            if !state.conversations.contains_key(&message.conversation_id) {
                return Err(Error::NotFound(format!(
                    "Conversation {} not found",
                    message.conversation_id
                )));
            }

            state.next_sequence += 1;
            let created = Message {
                id: message.id,
                conversation_id: message.conversation_id.clone(),
                sender_id: message.sender_id.clone(),
                text: message.text.clone(),
                sequence: state.next_sequence,
                created_at: now,
            };
            state
                .messages
                .entry(created.conversation_id.clone())
                .or_default()
                .push(created.clone());
            created
        };

        self.changes.publish(ChangeEvent::Message {
            conversation_id: created.conversation_id.clone(),
        });
        Ok(created)
    }

    async fn list_by_conversation(&self, conversation_id: &ConversationId) -> Result<Vec<Message>> {
        let mut messages = {
            let state = self.state();
            injected(&state.failures.reads)?;
            state
                .messages
                .get(conversation_id)
                .cloned()
                .unwrap_or_default()
        };

        messages.sort_by_key(Message::ordering_key);
        Ok(messages)
    }
}
