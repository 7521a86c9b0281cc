//! Route definitions for Listings domain API

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::handlers::listings;
use super::middleware::ListingsState;

/// Largest accepted multipart body (image plus form fields)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create all Listings domain API routes
pub fn routes() -> Router<ListingsState> {
    Router::new()
        .route(
            "/v1/listings",
            get(listings::list_feed).post(listings::create_listing),
        )
        .route("/v1/listings/mine", get(listings::list_my_listings))
        .route(
            "/v1/listings/{id}",
            get(listings::get_listing)
                .patch(listings::update_listing)
                .delete(listings::delete_listing),
        )
        .route(
            "/v1/listings/{id}/toggle-status",
            post(listings::toggle_status),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
