//! Standardized API response formats
//!
//! This module provides the response envelopes used by all API endpoints so
//! clients see a consistent shape: single resources under `data`, lists
//! under `data` with a `pagination` block.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use utoipa::ToSchema;

/// A standardized API response wrapper for single resource responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// The response data
    pub data: T,
}

/// A standardized API response wrapper for paginated list responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// The list of items in this page
    pub data: Vec<T>,
    /// Pagination metadata
    pub pagination: PaginationMetadata,
}

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginationMetadata {
    /// The current page number (1-based)
    pub page: usize,
    /// The number of items per page
    pub per_page: usize,
    /// The total number of items
    pub total: usize,
    /// The total number of pages
    pub total_pages: usize,
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl<T> IntoResponse for PaginatedResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl<T> ApiResponse<T> {
    /// Create a new API response with the given data
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response
    pub fn new(data: Vec<T>, page: usize, per_page: usize, total: usize) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            data,
            pagination: PaginationMetadata {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }
}
