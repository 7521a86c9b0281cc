//! Change feed
//!
//! Every committed write publishes a `ChangeEvent`. Watchers listen on the
//! in-process broadcast channel and reload their snapshot when an event
//! touches what they watch. With Postgres the events travel through
//! `NOTIFY thrift_changes`, so writes made by other processes are seen too.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use thrift_common::Result;

use crate::domain::identity::ConversationId;

/// Postgres notification channel carrying `ChangeEvent` JSON
pub const CHANGE_CHANNEL: &str = "thrift_changes";

const DEFAULT_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A conversation record was created, merged or had its activity bumped
    Conversation {
        conversation_id: ConversationId,
        participants: Vec<String>,
    },
    /// A message was appended
    Message { conversation_id: ConversationId },
    /// Events may have been lost; every watcher must reload
    Resync,
}

impl ChangeEvent {
    /// Whether a watcher of `conversation_id`'s messages must reload
    pub fn affects_messages_of(&self, conversation_id: &ConversationId) -> bool {
        match self {
            ChangeEvent::Message {
                conversation_id: changed,
            } => changed == conversation_id,
            ChangeEvent::Conversation { .. } => false,
            ChangeEvent::Resync => true,
        }
    }

    /// Whether a watcher of `user_id`'s conversation list must reload
    pub fn affects_index_of(&self, user_id: &str) -> bool {
        match self {
            ChangeEvent::Conversation { participants, .. } => {
                participants.iter().any(|p| p == user_id)
            }
            ChangeEvent::Message { .. } => false,
            ChangeEvent::Resync => true,
        }
    }
}

/// In-process fan-out of change events
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No watchers is not an error
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn watcher_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Send `event` to every listener of `CHANGE_CHANNEL`
pub(crate) async fn notify(pool: &PgPool, event: &ChangeEvent) -> Result<()> {
    let payload = serde_json::to_string(event)?;
    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(CHANGE_CHANNEL)
        .bind(payload)
        .execute(pool)
        .await?;
    Ok(())
}

/// Forward Postgres notifications into `feed`
///
/// The listener reconnects on its own after a dropped connection; anything
/// sent meanwhile is lost, so a `Resync` is published once it is back.
#[mutants::skip] // Needs a live Postgres connection
pub async fn spawn_pg_listener(pool: &PgPool, feed: ChangeFeed) -> Result<JoinHandle<()>> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(CHANGE_CHANNEL).await?;

    tracing::info!(channel = CHANGE_CHANNEL, "Listening for change notifications");

    Ok(tokio::spawn(async move {
        let mut disconnected = false;
        loop {
            match listener.try_recv().await {
                Ok(Some(notification)) => {
                    if disconnected {
                        disconnected = false;
                        feed.publish(ChangeEvent::Resync);
                    }
                    match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                        Ok(event) => feed.publish(event),
                        Err(e) => tracing::warn!(
                            error = %e,
                            payload = notification.payload(),
                            "Ignoring malformed change notification"
                        ),
                    }
                }
                Ok(None) => {
                    tracing::warn!("Change listener connection lost, reconnecting");
                    disconnected = true;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Change listener failed");
                    feed.publish(ChangeEvent::Resync);
                    break;
                }
            }
        }
    }))
}
