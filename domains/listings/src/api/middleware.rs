//! Listings domain state and auth backend integration

use std::sync::Arc;

use axum::extract::FromRef;
use thrift_auth::AuthBackend;
use thrift_storage::ObjectStorage;

use crate::repository::ListingRepository;

/// Application state for the Listings domain
#[derive(Clone)]
pub struct ListingsState {
    pub listings: Arc<dyn ListingRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub auth: AuthBackend,
}

impl FromRef<ListingsState> for AuthBackend {
    fn from_ref(state: &ListingsState) -> Self {
        state.auth.clone()
    }
}
