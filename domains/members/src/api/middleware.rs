//! Members domain state and auth backend integration

use std::sync::Arc;

use axum::extract::FromRef;
use thrift_auth::AuthBackend;

use crate::domain::gate::CommunityGate;
use crate::repository::MemberRepository;

/// Application state for the Members domain
#[derive(Clone)]
pub struct MembersState {
    pub members: Arc<dyn MemberRepository>,
    pub gate: Arc<CommunityGate>,
    pub auth: AuthBackend,
}

impl FromRef<MembersState> for AuthBackend {
    fn from_ref(state: &MembersState) -> Self {
        state.auth.clone()
    }
}
