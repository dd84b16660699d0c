//! Listing API handlers
//!
//! Handlers for the listing catalog:
//! - Create listings (caller becomes the seller)
//! - Browse active listings
//! - Get listing details
//! - Deactivate a listing (soft delete)

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use common::decimal::Price;
use common::model::listing::{Category, Listing};
use listing_catalog::{ListingQuery, NewListing};
use serde::Deserialize;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::error::ApiError;
use crate::AppState;
use crate::api::response::{ApiResponse, PaginatedResponse};

/// Create listing request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    /// Title (1-200 characters)
    pub title: String,
    /// Description of the offered information
    pub description: String,
    /// Category
    pub category: Category,
    /// Price (non-negative, immutable after creation)
    pub price: Price,
}

/// Create a new listing; the caller becomes the seller
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 200, description = "Listing created successfully"),
        (status = 400, description = "Invalid listing request"),
        (status = 401, description = "Missing caller identity"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Json(request): Json<CreateListingRequest>,
) -> Result<ApiResponse<Listing>, ApiError> {
    // The caller must have an account before selling
    state.ledger.get_account(caller.0).await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {}", caller.0)))?;

    let listing = state.catalog
        .create_listing(
            caller.0,
            NewListing {
                title: request.title,
                description: request.description,
                category: request.category,
                price: request.price,
            },
        )
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(listing))
}

/// Browse active listings
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(
        ("page" = Option<usize>, Query, description = "Page number (1-based)"),
        ("limit" = Option<usize>, Query, description = "Items per page (max 100)"),
        ("category" = Option<String>, Query, description = "Filter by category")
    ),
    responses(
        (status = 200, description = "Listings retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn list_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> Result<PaginatedResponse<Listing>, ApiError> {
    let (listings, total) = state.catalog.list_active(&query).await
        .map_err(ApiError::Common)?;

    let (offset, limit) = query.to_offset_limit();
    Ok(PaginatedResponse::new(listings, offset / limit + 1, limit, total))
}

/// Get a listing by ID
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing retrieved successfully"),
        (status = 404, description = "Listing not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Listing>, ApiError> {
    // Fetching the detail counts as a view
    let listing = state.catalog.record_view(id).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(listing))
}

/// Deactivate a listing (soft delete); only the seller may do this
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/deactivate",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing deactivated successfully"),
        (status = 403, description = "Caller is not the seller"),
        (status = 404, description = "Listing not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn deactivate_listing(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Listing>, ApiError> {
    let listing = state.catalog.deactivate(id, caller.0).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(listing))
}
