//! Conversations domain: two-party chat threads between a listing's buyer and seller
//!
//! - `domain::identity` derives the canonical conversation id for a pair of users
//! - `service::ConversationStore` creates/merges conversation records and bumps activity
//! - `service::MessageStream` appends messages and serves ordered live views
//! - `service::ConversationIndex` lists a user's conversations by recency with their role

pub mod api;
pub mod config;
pub mod domain;
pub mod repository;
pub mod service;
pub mod subscription;

// Re-export domain types at the crate root for convenience
pub use config::{ChatConfig, SnapshotPolicy};
pub use domain::entities::{
    Conversation, ConversationDraft, ConversationRole, ConversationSummary, Message, NewMessage,
};
pub use domain::identity::{derive_id, ConversationId};

// Re-export repository types
pub use repository::{
    spawn_pg_listener, ChangeEvent, ChangeFeed, ConversationRepository,
    ConversationsRepositories, InMemoryChatStore, MessageRepository,
};

// Re-export services
pub use service::{ConversationIndex, ConversationStore, MessageStream};
pub use subscription::{Subscription, SubscriptionHandle};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;
