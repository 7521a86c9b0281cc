//! The authenticated actor

use crate::claims::IdentityClaims;

/// Current actor as supplied by the identity provider.
///
/// Only a stable id and a display name are needed by the domains; the email
/// is kept for member registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl AuthContext {
    pub fn new(user_id: String, display_name: String, email: Option<String>) -> Self {
        Self {
            user_id,
            display_name,
            email,
        }
    }

    /// Build the context from validated claims.
    ///
    /// Display name falls back to the email, then to the subject.
    pub fn from_claims(claims: IdentityClaims) -> Self {
        let display_name = claims
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| claims.email.clone())
            .unwrap_or_else(|| claims.sub.clone());

        Self {
            user_id: claims.sub,
            display_name,
            email: claims.email,
        }
    }

    /// Check whether this actor is the given user
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
