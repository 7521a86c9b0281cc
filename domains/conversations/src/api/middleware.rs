//! Conversations domain state and auth backend integration

use std::sync::Arc;

use axum::extract::FromRef;
use thrift_auth::AuthBackend;
use thrift_listings::ListingRepository;

use crate::config::ChatConfig;
use crate::repository::ConversationsRepositories;
use crate::service::{ConversationIndex, ConversationStore, MessageStream};

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub store: ConversationStore,
    pub stream: MessageStream,
    pub index: ConversationIndex,
    /// Listing lookup for the contact action
    pub listings: Arc<dyn ListingRepository>,
    pub auth: AuthBackend,
}

impl ConversationsState {
    pub fn new(
        repos: ConversationsRepositories,
        listings: Arc<dyn ListingRepository>,
        auth: AuthBackend,
        config: &ChatConfig,
    ) -> Self {
        let store = ConversationStore::new(repos.conversations.clone(), config.snapshot_policy);
        Self {
            stream: MessageStream::new(
                store.clone(),
                repos.messages.clone(),
                repos.changes.clone(),
                config,
            ),
            index: ConversationIndex::new(repos.conversations.clone(), repos.changes, config),
            store,
            listings,
            auth,
        }
    }
}

impl FromRef<ConversationsState> for AuthBackend {
    fn from_ref(state: &ConversationsState) -> Self {
        state.auth.clone()
    }
}
