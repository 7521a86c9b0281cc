//! Repository implementations for Conversations domain
//!
//! Two backends sit behind the same traits: Postgres (production) and an
//! in-memory store (tests, local development). Both publish to a
//! `ChangeFeed` after each committed write.

pub mod changes;
pub mod conversations;
pub mod memory;
pub mod messages;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use thrift_common::{Clock, Result, SystemClock};

use crate::config::SnapshotPolicy;
use crate::domain::entities::{Conversation, ConversationDraft, Message, NewMessage};
use crate::domain::identity::ConversationId;

pub use changes::{spawn_pg_listener, ChangeEvent, ChangeFeed, CHANGE_CHANNEL};
pub use conversations::PgConversationRepository;
pub use memory::InMemoryChatStore;
pub use messages::PgMessageRepository;

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Create the conversation or merge `draft` into the existing record.
    ///
    /// Never creates a second record for the same id; activity never moves
    /// backwards.
    async fn upsert(&self, draft: &ConversationDraft, policy: SnapshotPolicy)
        -> Result<Conversation>;

    async fn find(&self, id: &ConversationId) -> Result<Option<Conversation>>;

    /// Raise `last_activity_at` to at least now and the newest message time.
    /// `None` if the conversation does not exist.
    async fn touch_activity(&self, id: &ConversationId) -> Result<Option<Conversation>>;

    /// Conversations `user_id` takes part in, most recent activity first, ties by id
    async fn list_for_participant(&self, user_id: &str) -> Result<Vec<Conversation>>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert with a server-assigned timestamp and sequence
    async fn create(&self, message: &NewMessage) -> Result<Message>;

    /// Full history ordered by `created_at`, ties by `sequence`
    async fn list_by_conversation(&self, conversation_id: &ConversationId) -> Result<Vec<Message>>;
}

/// Combined repository access for the Conversations domain
#[derive(Clone)]
pub struct ConversationsRepositories {
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub changes: ChangeFeed,
}

impl ConversationsRepositories {
    /// Postgres-backed repositories. Events reach `changes` through the
    /// notification listener (see `spawn_pg_listener`), not directly.
    pub fn postgres(pool: PgPool, changes: ChangeFeed) -> Self {
        Self {
            conversations: Arc::new(PgConversationRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool)),
            changes,
        }
    }

    pub fn in_memory() -> Self {
        Self::in_memory_with_clock(Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Self {
        let changes = ChangeFeed::default();
        Self::from_memory(InMemoryChatStore::with_clock(changes, clock))
    }

    /// Wrap an existing in-memory store (keeps a handle for failure injection)
    pub fn from_memory(store: InMemoryChatStore) -> Self {
        Self {
            changes: store.changes(),
            conversations: Arc::new(store.clone()),
            messages: Arc::new(store),
        }
    }
}
