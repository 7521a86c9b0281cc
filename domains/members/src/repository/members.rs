//! Postgres member repository

use async_trait::async_trait;
use sqlx::PgPool;

use thrift_common::{Error, Result};

use super::MemberRepository;
use crate::domain::entities::Member;

#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    async fn create(&self, member: &Member) -> Result<Member> {
        sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (user_id, name, email, community_verified, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING user_id, name, email, community_verified, created_at
            "#,
        )
        .bind(&member.user_id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(member.community_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::Conflict("Member is already registered".to_string())
            }
            other => Error::Database(other),
        })
    }

    async fn find(&self, user_id: &str) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT user_id, name, email, community_verified, created_at
            FROM members
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }
}
