//! Listing management API handlers

use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thrift_auth::AuthUser;
use thrift_common::{Error, Pagination, Result, ValidatedJson};
use thrift_storage::{object_key, ObjectUpload, ProgressFn, StorageError, UploadProgress};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ListingsState;
use crate::domain::entities::{
    Category, Listing, ListingFilter, ListingStatus, ListingUpdate, NewListing, MAX_PRICE,
};

/// Listing response DTO
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub id: Uuid,
    pub title: String,
    pub price: i64,
    pub category: Category,
    pub image_url: String,
    pub seller_id: String,
    pub seller_name: String,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Listing> for ListingResponse {
    fn from(l: Listing) -> Self {
        Self {
            id: l.id,
            title: l.title,
            price: l.price,
            category: l.category,
            image_url: l.image_url,
            seller_id: l.seller_id,
            seller_name: l.seller_name,
            status: l.status,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

/// Feed query parameters
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    /// Title search
    pub q: Option<String>,
    /// Category name or `All`
    pub category: Option<String>,
}

/// Request for editing a listing
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateListingRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(range(min = 1, max = MAX_PRICE))]
    pub price: Option<i64>,
}

/// Image part of the create form
struct ImagePart {
    file_name: String,
    content_type: String,
    body: Bytes,
}

/// Raw fields of the create form
#[derive(Default)]
struct CreateForm {
    title: Option<String>,
    price: Option<String>,
    category: Option<String>,
    image: Option<ImagePart>,
}

fn multipart_error(e: impl std::fmt::Display) -> Error {
    Error::Validation(format!("Invalid multipart body: {}", e))
}

fn storage_error(e: StorageError) -> Error {
    match e {
        StorageError::Validation(msg) => Error::Validation(msg),
        other => Error::Storage(other.to_string()),
    }
}

async fn text_field(field: Field<'_>) -> Result<String> {
    field.text().await.map_err(multipart_error)
}

async fn read_create_form(mut multipart: Multipart) -> Result<CreateForm> {
    let mut form = CreateForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(text_field(field).await?),
            "price" => form.price = Some(text_field(field).await?),
            "category" => form.category = Some(text_field(field).await?),
            "image" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let body = field.bytes().await.map_err(multipart_error)?;
                form.image = Some(ImagePart {
                    file_name,
                    content_type,
                    body,
                });
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown listing form field");
            }
        }
    }

    Ok(form)
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value.ok_or_else(|| Error::Validation(format!("{} is required", name)))
}

#[mutants::skip] // Only emits debug logs
fn progress_logger(key: String) -> ProgressFn {
    let last = Arc::new(std::sync::atomic::AtomicU8::new(0));
    Arc::new(move |progress: UploadProgress| {
        let percent = progress.percent();
        let previous = last.swap(percent, std::sync::atomic::Ordering::Relaxed);
        if percent != previous {
            tracing::debug!(key = %key, percent, "Image upload progress");
        }
    })
}

/// Publish a listing: multipart form with `title`, `price`, `category`, `image`.
///
/// The image is stored first; the listing record is only written once the
/// upload succeeded.
pub async fn create_listing(
    AuthUser(ctx): AuthUser,
    State(state): State<ListingsState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ListingResponse>)> {
    let form = read_create_form(multipart).await?;

    let draft = NewListing::new(
        &required(form.title, "Title")?,
        &required(form.price, "Price")?,
        &required(form.category, "Category")?,
        &ctx.user_id,
        &ctx.display_name,
    )?;

    let image = form
        .image
        .ok_or_else(|| Error::Validation("An image is required".to_string()))?;
    if !image.content_type.starts_with("image/") {
        return Err(Error::Validation(format!(
            "Image must have an image/* content type, got '{}'",
            image.content_type
        )));
    }

    let key = object_key(&image.file_name, Utc::now());
    let stored = state
        .storage
        .put_object(
            ObjectUpload::new(key.clone(), image.content_type, image.body),
            Some(progress_logger(key)),
        )
        .await
        .map_err(storage_error)?;

    let listing = Listing::publish(draft, stored.url, stored.key);
    let created = state.listings.create(&listing).await?;

    tracing::info!(
        listing_id = %created.id,
        seller_id = %created.seller_id,
        storage = state.storage.service_name(),
        "Listing published"
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Public feed: available listings, newest first
pub async fn list_feed(
    AuthUser(_ctx): AuthUser,
    State(state): State<ListingsState>,
    Query(query): Query<FeedQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<ListingResponse>>> {
    let category = Category::parse_filter(query.category.as_deref())?;
    let filter = ListingFilter::new(query.q.as_deref(), category);

    let listings = state.listings.feed(&filter, page).await?;
    Ok(Json(listings.into_iter().map(Into::into).collect()))
}

/// The caller's own listings, sold included
pub async fn list_my_listings(
    AuthUser(ctx): AuthUser,
    State(state): State<ListingsState>,
) -> Result<Json<Vec<ListingResponse>>> {
    let listings = state.listings.list_by_seller(&ctx.user_id).await?;
    Ok(Json(listings.into_iter().map(Into::into).collect()))
}

async fn load(state: &ListingsState, id: Uuid) -> Result<Listing> {
    state
        .listings
        .find(id)
        .await?
        .ok_or_else(|| Error::NotFound("Listing not found".to_string()))
}

async fn save(state: &ListingsState, listing: &Listing) -> Result<Listing> {
    state
        .listings
        .update(listing)
        .await?
        .ok_or_else(|| Error::NotFound("Listing not found".to_string()))
}

/// Get a single listing
pub async fn get_listing(
    AuthUser(_ctx): AuthUser,
    State(state): State<ListingsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ListingResponse>> {
    Ok(Json(load(&state, id).await?.into()))
}

/// Edit title and/or price (seller only)
pub async fn update_listing(
    AuthUser(ctx): AuthUser,
    State(state): State<ListingsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateListingRequest>,
) -> Result<Json<ListingResponse>> {
    let mut listing = load(&state, id).await?;
    listing.ensure_owned_by(&ctx.user_id)?;

    listing.apply_update(&ListingUpdate {
        title: req.title,
        price: req.price,
    })?;

    Ok(Json(save(&state, &listing).await?.into()))
}

/// Flip between available and sold (seller only)
pub async fn toggle_status(
    AuthUser(ctx): AuthUser,
    State(state): State<ListingsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ListingResponse>> {
    let mut listing = load(&state, id).await?;
    listing.ensure_owned_by(&ctx.user_id)?;
    listing.toggle_status()?;

    let saved = save(&state, &listing).await?;
    tracing::info!(listing_id = %saved.id, status = %saved.status, "Listing status changed");
    Ok(Json(saved.into()))
}

/// Delete a listing (seller only)
pub async fn delete_listing(
    AuthUser(ctx): AuthUser,
    State(state): State<ListingsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let listing = load(&state, id).await?;
    listing.ensure_owned_by(&ctx.user_id)?;

    if !state.listings.delete(id).await? {
        return Err(Error::NotFound("Listing not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
