//! Authentication for the thrift marketplace API
//!
//! Identities come from an external provider that issues HS256 JWTs. This
//! crate validates those tokens and exposes the current actor through axum
//! extractors that work with any domain state implementing `FromRef<S>` for
//! `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;

pub use backend::AuthBackend;
pub use claims::IdentityClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::AuthUser;
