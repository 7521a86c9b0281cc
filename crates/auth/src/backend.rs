//! Concrete authentication backend
//!
//! The identity provider owns accounts; the backend only verifies the
//! provider's tokens and turns their claims into an `AuthContext`.
//!
//! Domain states expose this via `FromRef`:
//! ```ignore
//! impl FromRef<MyDomainState> for AuthBackend {
//!     fn from_ref(state: &MyDomainState) -> Self {
//!         state.auth.clone()
//!     }
//! }
//! ```

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;

#[derive(Debug, Clone)]
pub struct AuthBackend {
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a bearer token and resolve the actor it names
    pub fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = crate::jwt::validate_jwt_token(token, &self.config)?;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidUserId);
        }

        let ctx = AuthContext::from_claims(claims);
        tracing::trace!(user_id = %ctx.user_id, "Authenticated request");
        Ok(ctx)
    }
}
