//! Repository implementations for Members domain

pub mod members;
pub mod memory;

use async_trait::async_trait;

use thrift_common::Result;

use crate::domain::entities::Member;

pub use members::PgMemberRepository;
pub use memory::InMemoryMemberRepository;

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Store a new member; `Error::Conflict` if the user is already registered
    async fn create(&self, member: &Member) -> Result<Member>;

    async fn find(&self, user_id: &str) -> Result<Option<Member>>;
}
