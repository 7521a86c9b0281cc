//! Member API handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thrift_auth::AuthUser;
use thrift_common::{Error, Result, ValidatedJson};
use validator::Validate;

use crate::api::middleware::MembersState;
use crate::domain::entities::Member;

/// Gate questions, prompts only
#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

/// Request for registering as a member
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// One answer per gate question, in order
    #[validate(length(min = 1))]
    pub answers: Vec<String>,
}

/// Member response DTO
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub community_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberResponse {
    fn from(m: Member) -> Self {
        Self {
            user_id: m.user_id,
            name: m.name,
            email: m.email,
            community_verified: m.community_verified,
            created_at: m.created_at,
        }
    }
}

/// List the community gate questions
pub async fn list_questions(State(state): State<MembersState>) -> Json<QuestionsResponse> {
    Json(QuestionsResponse {
        questions: state.gate.prompts(),
    })
}

/// Answer the gate questions and create the caller's member profile
pub async fn register(
    AuthUser(ctx): AuthUser,
    State(state): State<MembersState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MemberResponse>)> {
    if let Err(e) = state.gate.verify(&req.answers) {
        tracing::info!(user_id = %ctx.user_id, "Community gate rejected registration");
        return Err(e);
    }

    let member = Member::verified(&ctx.user_id, &req.name, ctx.email.clone())?;
    let created = state.members.create(&member).await?;

    tracing::info!(user_id = %created.user_id, "Member registered");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// The caller's member profile
pub async fn get_me(
    AuthUser(ctx): AuthUser,
    State(state): State<MembersState>,
) -> Result<Json<MemberResponse>> {
    let member = state
        .members
        .find(&ctx.user_id)
        .await?
        .ok_or_else(|| Error::NotFound("Member not registered".to_string()))?;
    Ok(Json(member.into()))
}
