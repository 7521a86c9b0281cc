//! Listings domain: items members put up for sale

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{
    parse_price, Category, Listing, ListingFilter, ListingStatus, ListingUpdate, NewListing,
};
pub use domain::state::{ListingEvent, ListingStateMachine};

// Re-export repository types
pub use repository::{InMemoryListingRepository, ListingRepository, PgListingRepository};

// Re-export API types
pub use api::routes;
pub use api::ListingsState;
