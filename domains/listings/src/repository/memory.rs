//! In-memory listing repository for tests and local development

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use thrift_common::{Pagination, Result};

use super::ListingRepository;
use crate::domain::entities::{Listing, ListingFilter};

#[derive(Clone, Default)]
pub struct InMemoryListingRepository {
    listings: Arc<Mutex<HashMap<Uuid, Listing>>>,
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.listings().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings().is_empty()
    }

    fn listings(&self) -> MutexGuard<'_, HashMap<Uuid, Listing>> {
        self.listings.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn newest_first(mut listings: Vec<Listing>) -> Vec<Listing> {
        listings.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        listings
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn create(&self, listing: &Listing) -> Result<Listing> {
        self.listings().insert(listing.id, listing.clone());
        Ok(listing.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Listing>> {
        Ok(self.listings().get(&id).cloned())
    }

    async fn feed(&self, filter: &ListingFilter, page: Pagination) -> Result<Vec<Listing>> {
        let matching = self
            .listings()
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        Ok(page.apply(Self::newest_first(matching)))
    }

    async fn list_by_seller(&self, seller_id: &str) -> Result<Vec<Listing>> {
        let own = self
            .listings()
            .values()
            .filter(|l| l.seller_id == seller_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(own))
    }

    async fn update(&self, listing: &Listing) -> Result<Option<Listing>> {
        let mut listings = self.listings();
        let Some(stored) = listings.get_mut(&listing.id) else {
            return Ok(None);
        };
        stored.title = listing.title.clone();
        stored.price = listing.price;
        stored.status = listing.status;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.listings().remove(&id).is_some())
    }
}
