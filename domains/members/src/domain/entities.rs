//! Domain entities for Members domain

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thrift_common::{Error, Result};

/// Maximum display name length (varchar(100))
pub const MAX_NAME_LENGTH: usize = 100;

/// Member profile, created once the community gate is passed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    /// Identity provider subject
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub community_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Profile of a user who just passed the gate
    pub fn verified(user_id: &str, name: &str, email: Option<String>) -> Result<Self> {
        if user_id.trim().is_empty() {
            return Err(Error::Validation("User id is required".to_string()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Name is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::Validation(format!(
                "Name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }

        Ok(Self {
            user_id: user_id.to_string(),
            name: name.to_string(),
            email,
            community_verified: true,
            created_at: Utc::now(),
        })
    }
}
