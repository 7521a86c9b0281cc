//! Domain entities for Listings domain

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use thrift_common::{Error, Result};

use super::state::{ListingEvent, ListingStateMachine};

/// Maximum title length (varchar(200))
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum price, in whole currency units
pub const MAX_PRICE: i64 = 100_000_000;

/// Item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_category", rename_all = "lowercase")]
pub enum Category {
    Tops,
    Bottoms,
    Shoes,
    Accessories,
    Outerwear,
    Vintage,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Tops,
        Category::Bottoms,
        Category::Shoes,
        Category::Accessories,
        Category::Outerwear,
        Category::Vintage,
    ];

    /// Parse a feed filter: `All` (or nothing) means no filter
    pub fn parse_filter(raw: Option<&str>) -> Result<Option<Category>> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Tops => write!(f, "Tops"),
            Category::Bottoms => write!(f, "Bottoms"),
            Category::Shoes => write!(f, "Shoes"),
            Category::Accessories => write!(f, "Accessories"),
            Category::Outerwear => write!(f, "Outerwear"),
            Category::Vintage => write!(f, "Vintage"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Validation(format!("Unknown category: {}", s.trim())))
    }
}

/// Listing availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "listing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Available,
    Sold,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::Available => write!(f, "available"),
            ListingStatus::Sold => write!(f, "sold"),
        }
    }
}

/// Parse a price typed by a seller: a positive whole number
pub fn parse_price(raw: &str) -> Result<i64> {
    let price: i64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::Validation("Price must be a whole number".to_string()))?;
    validate_price(price)?;
    Ok(price)
}

fn validate_price(price: i64) -> Result<()> {
    if price <= 0 {
        return Err(Error::Validation("Price must be positive".to_string()));
    }
    if price > MAX_PRICE {
        return Err(Error::Validation(format!(
            "Price must be at most {}",
            MAX_PRICE
        )));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(Error::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

/// Listing entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub price: i64,
    pub category: Category,
    pub image_url: String,
    pub image_key: String,
    pub seller_id: String,
    pub seller_name: String,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields of a listing about to be published, before its image is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub title: String,
    pub price: i64,
    pub category: Category,
    pub seller_id: String,
    pub seller_name: String,
}

impl NewListing {
    pub fn new(
        title: &str,
        price: &str,
        category: &str,
        seller_id: &str,
        seller_name: &str,
    ) -> Result<Self> {
        if seller_id.trim().is_empty() {
            return Err(Error::Validation("Seller id is required".to_string()));
        }
        Ok(Self {
            title: validate_title(title)?,
            price: parse_price(price)?,
            category: category.parse()?,
            seller_id: seller_id.to_string(),
            seller_name: seller_name.trim().to_string(),
        })
    }
}

impl Listing {
    /// Publish `draft` with its stored image
    pub fn publish(draft: NewListing, image_url: String, image_key: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            price: draft.price,
            category: draft.category,
            image_url,
            image_key,
            seller_id: draft.seller_id,
            seller_name: draft.seller_name,
            status: ListingStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_sold(&self) -> bool {
        self.status == ListingStatus::Sold
    }

    pub fn ensure_owned_by(&self, actor_id: &str) -> Result<()> {
        if self.seller_id == actor_id {
            Ok(())
        } else {
            Err(Error::Authorization(
                "Only the seller can modify this listing".to_string(),
            ))
        }
    }

    /// Apply a state machine event to the status
    pub fn apply(&mut self, event: ListingEvent) -> Result<()> {
        self.status = ListingStateMachine::transition(self.status, event)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Flip between available and sold
    pub fn toggle_status(&mut self) -> Result<()> {
        self.apply(ListingStateMachine::toggle_event(self.status))
    }

    pub fn apply_update(&mut self, update: &ListingUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(Error::Validation(
                "Nothing to update: provide a title or a price".to_string(),
            ));
        }
        let title = update.title.as_deref().map(validate_title).transpose()?;
        if let Some(price) = update.price {
            validate_price(price)?;
            self.price = price;
        }
        if let Some(title) = title {
            self.title = title;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Owner edit of title and/or price
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub price: Option<i64>,
}

impl ListingUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.price.is_none()
    }
}

/// Public feed filter. Sold listings never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Case-insensitive substring of the title
    pub query: Option<String>,
    pub category: Option<Category>,
}

impl ListingFilter {
    pub fn new(query: Option<&str>, category: Option<Category>) -> Self {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        Self { query, category }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if listing.is_sold() {
            return false;
        }
        if self.category.is_some_and(|c| c != listing.category) {
            return false;
        }
        match &self.query {
            Some(q) => listing.title.to_lowercase().contains(q.as_str()),
            None => true,
        }
    }
}
