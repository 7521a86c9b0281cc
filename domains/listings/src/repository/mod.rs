//! Repository implementations for Listings domain

pub mod listings;
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use thrift_common::{Pagination, Result};

use crate::domain::entities::{Listing, ListingFilter};

pub use listings::PgListingRepository;
pub use memory::InMemoryListingRepository;

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create(&self, listing: &Listing) -> Result<Listing>;

    async fn find(&self, id: Uuid) -> Result<Option<Listing>>;

    /// Available listings matching `filter`, newest first
    async fn feed(&self, filter: &ListingFilter, page: Pagination) -> Result<Vec<Listing>>;

    /// Every listing of one seller (sold included), newest first
    async fn list_by_seller(&self, seller_id: &str) -> Result<Vec<Listing>>;

    /// Persist title, price and status. `None` if the listing is gone.
    async fn update(&self, listing: &Listing) -> Result<Option<Listing>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}
