//! Route definitions for Members domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::members;
use super::middleware::MembersState;

/// Create all Members domain API routes
pub fn routes() -> Router<MembersState> {
    Router::new()
        .route("/v1/community/questions", get(members::list_questions))
        .route("/v1/members/register", post(members::register))
        .route("/v1/members/me", get(members::get_me))
}
