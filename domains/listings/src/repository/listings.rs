//! Postgres listing repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use thrift_common::{Pagination, Result};

use super::ListingRepository;
use crate::domain::entities::{Listing, ListingFilter};

#[derive(Clone)]
pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards in a user-supplied search term
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn create(&self, listing: &Listing) -> Result<Listing> {
        let created = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO listings (
                id, title, price, category, image_url, image_key,
                seller_id, seller_name, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
            RETURNING id, title, price, category, image_url, image_key,
                      seller_id, seller_name, status, created_at, updated_at
            "#,
        )
        .bind(listing.id)
        .bind(&listing.title)
        .bind(listing.price)
        .bind(listing.category)
        .bind(&listing.image_url)
        .bind(&listing.image_key)
        .bind(&listing.seller_id)
        .bind(&listing.seller_name)
        .bind(listing.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Listing>> {
        let listing = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, title, price, category, image_url, image_key,
                   seller_id, seller_name, status, created_at, updated_at
            FROM listings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn feed(&self, filter: &ListingFilter, page: Pagination) -> Result<Vec<Listing>> {
        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, title, price, category, image_url, image_key,
                   seller_id, seller_name, status, created_at, updated_at
            FROM listings
            WHERE status = 'available'
              AND ($1::listing_category IS NULL OR category = $1)
              AND ($2::TEXT IS NULL OR title ILIKE $2)
            ORDER BY created_at DESC, id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.category)
        .bind(filter.query.as_deref().map(like_pattern))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    async fn list_by_seller(&self, seller_id: &str) -> Result<Vec<Listing>> {
        let listings = sqlx::query_as::<_, Listing>(
            r#"
            SELECT id, title, price, category, image_url, image_key,
                   seller_id, seller_name, status, created_at, updated_at
            FROM listings
            WHERE seller_id = $1
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    async fn update(&self, listing: &Listing) -> Result<Option<Listing>> {
        let updated = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE listings SET
                title = $2,
                price = $3,
                status = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, price, category, image_url, image_key,
                      seller_id, seller_name, status, created_at, updated_at
            "#,
        )
        .bind(listing.id)
        .bind(&listing.title)
        .bind(listing.price)
        .bind(listing.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
