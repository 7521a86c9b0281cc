//! In-memory member repository for tests and local development

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use thrift_common::{Error, Result};

use super::MemberRepository;
use crate::domain::entities::Member;

#[derive(Clone, Default)]
pub struct InMemoryMemberRepository {
    members: Arc<Mutex<HashMap<String, Member>>>,
}

impl InMemoryMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn create(&self, member: &Member) -> Result<Member> {
        let mut members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        match members.entry(member.user_id.clone()) {
            Entry::Occupied(_) => Err(Error::Conflict("Member is already registered".to_string())),
            Entry::Vacant(slot) => Ok(slot.insert(member.clone()).clone()),
        }
    }

    async fn find(&self, user_id: &str) -> Result<Option<Member>> {
        let members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        Ok(members.get(user_id).cloned())
    }
}
