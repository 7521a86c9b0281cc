//! Conversations configuration

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thrift_common::{Error, Result};

const DEFAULT_SUBSCRIPTION_BUFFER: usize = 16;

/// What a repeated contact does to an existing conversation's snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Overwrite item title, buyer and seller with the latest contact's values
    #[default]
    LastContactWins,
    /// Keep the values recorded when the conversation was first opened
    KeepFirst,
}

impl FromStr for SnapshotPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last_contact_wins" | "last-contact-wins" => Ok(SnapshotPolicy::LastContactWins),
            "keep_first" | "keep-first" => Ok(SnapshotPolicy::KeepFirst),
            other => Err(Error::Validation(format!(
                "Unknown conversation snapshot policy: {}. Supported: last_contact_wins, keep_first",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub snapshot_policy: SnapshotPolicy,
    /// Snapshots a subscriber may fall behind before the watcher waits on it
    pub subscription_buffer: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            snapshot_policy: SnapshotPolicy::default(),
            subscription_buffer: DEFAULT_SUBSCRIPTION_BUFFER,
        }
    }
}

impl ChatConfig {
    /// Load from `CONVERSATION_SNAPSHOT_POLICY` and `SUBSCRIPTION_BUFFER`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let snapshot_policy = match std::env::var("CONVERSATION_SNAPSHOT_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => SnapshotPolicy::default(),
        };

        let subscription_buffer = match std::env::var("SUBSCRIPTION_BUFFER") {
            Ok(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::Validation(format!("Invalid SUBSCRIPTION_BUFFER: {}", raw)))?,
            Err(_) => DEFAULT_SUBSCRIPTION_BUFFER,
        };

        Ok(Self {
            snapshot_policy,
            subscription_buffer,
        })
    }
}
