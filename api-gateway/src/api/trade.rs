//! Trade API handlers
//!
//! Handlers for the settlement flow:
//! - Purchase a listing (create and settle in one call)
//! - List the caller's purchases and sales
//! - Get trade detail (parties only)
//! - Request a refund under the tiered window policy
//! - Rate a completed trade

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use common::decimal::Amount;
use common::model::trade::{TradeDetail, TradeRating, TradeRole, TradeStatistics};
use serde::{Deserialize, Serialize};
use trade_engine::TradeQuery;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::error::ApiError;
use crate::AppState;
use crate::api::response::{ApiResponse, PaginatedResponse};

/// Purchase request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    /// Listing to purchase
    pub listing_id: Uuid,
    /// Optional message to the seller (max 500 characters)
    pub message: Option<String>,
}

/// Purchase a listing as the authenticated caller.
///
/// The trade is created and settled within this call; the response carries
/// the completed trade with buyer, seller, and listing context attached.
#[utoipa::path(
    post,
    path = "/api/v1/trades/purchase",
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "Purchase settled successfully"),
        (status = 400, description = "Self-purchase or insufficient balance"),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "Listing not found or inactive"),
        (status = 409, description = "Duplicate purchase"),
        (status = 500, description = "Internal server error")
    ),
    tag = "trade"
)]
pub async fn purchase(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Json(request): Json<PurchaseRequest>,
) -> Result<ApiResponse<TradeDetail>, ApiError> {
    if let Some(message) = &request.message {
        if message.len() > 500 {
            return Err(ApiError::BadRequest(
                "Message must be at most 500 characters".to_string(),
            ));
        }
    }

    let detail = state.trades.purchase(caller.0, request.listing_id, request.message).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(detail))
}

/// List the caller's purchases
#[utoipa::path(
    get,
    path = "/api/v1/trades/my-purchases",
    params(
        ("page" = Option<usize>, Query, description = "Page number (1-based)"),
        ("limit" = Option<usize>, Query, description = "Items per page (max 100)"),
        ("status" = Option<String>, Query, description = "Filter by trade status")
    ),
    responses(
        (status = 200, description = "Purchases retrieved successfully"),
        (status = 401, description = "Missing caller identity"),
        (status = 500, description = "Internal server error")
    ),
    tag = "trade"
)]
pub async fn my_purchases(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Query(query): Query<TradeQuery>,
) -> Result<PaginatedResponse<TradeDetail>, ApiError> {
    let (trades, total) = state.trades.my_purchases(caller.0, &query).await
        .map_err(ApiError::Common)?;

    let (offset, limit) = query.to_offset_limit();
    Ok(PaginatedResponse::new(trades, offset / limit + 1, limit, total))
}

/// List the caller's sales
#[utoipa::path(
    get,
    path = "/api/v1/trades/my-sales",
    params(
        ("page" = Option<usize>, Query, description = "Page number (1-based)"),
        ("limit" = Option<usize>, Query, description = "Items per page (max 100)"),
        ("status" = Option<String>, Query, description = "Filter by trade status")
    ),
    responses(
        (status = 200, description = "Sales retrieved successfully"),
        (status = 401, description = "Missing caller identity"),
        (status = 500, description = "Internal server error")
    ),
    tag = "trade"
)]
pub async fn my_sales(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Query(query): Query<TradeQuery>,
) -> Result<PaginatedResponse<TradeDetail>, ApiError> {
    let (trades, total) = state.trades.my_sales(caller.0, &query).await
        .map_err(ApiError::Common)?;

    let (offset, limit) = query.to_offset_limit();
    Ok(PaginatedResponse::new(trades, offset / limit + 1, limit, total))
}

/// Statistics query parameters
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StatisticsQuery {
    /// Which side of past trades to aggregate over
    #[serde(default)]
    pub role: TradeRole,
}

/// Aggregate trade statistics for the caller
#[utoipa::path(
    get,
    path = "/api/v1/trades/statistics",
    params(
        ("role" = Option<String>, Query, description = "buyer, seller, or both (default)")
    ),
    responses(
        (status = 200, description = "Statistics retrieved successfully"),
        (status = 401, description = "Missing caller identity"),
        (status = 500, description = "Internal server error")
    ),
    tag = "trade"
)]
pub async fn statistics(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Query(query): Query<StatisticsQuery>,
) -> Result<ApiResponse<TradeStatistics>, ApiError> {
    let stats = state.trades.statistics(caller.0, query.role).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(stats))
}

/// Get a trade by ID; restricted to the two parties
#[utoipa::path(
    get,
    path = "/api/v1/trades/{id}",
    params(
        ("id" = Uuid, Path, description = "Trade ID")
    ),
    responses(
        (status = 200, description = "Trade retrieved successfully"),
        (status = 401, description = "Missing caller identity"),
        (status = 403, description = "Caller is not a party to the trade"),
        (status = 404, description = "Trade not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "trade"
)]
pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<TradeDetail>, ApiError> {
    let detail = state.trades.trade_detail(id, caller.0).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(detail))
}

/// Refund request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundRequest {
    /// Reason for the refund (max 500 characters)
    pub reason: Option<String>,
}

/// Refund response
#[derive(Debug, Serialize, ToSchema)]
pub struct RefundResponse {
    /// Amount returned to the buyer
    pub refund_amount: Amount,
    /// Buyer balance after the refund
    pub new_balance: Amount,
}

/// Request a refund on a completed trade.
///
/// Only the buyer may request one. Within 24 hours of completion the full
/// amount is returned; within 7 days, half; afterwards the request is
/// rejected.
#[utoipa::path(
    post,
    path = "/api/v1/trades/{id}/refund",
    params(
        ("id" = Uuid, Path, description = "Trade ID")
    ),
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Refund settled successfully"),
        (status = 400, description = "Refund window expired"),
        (status = 401, description = "Missing caller identity"),
        (status = 403, description = "Caller is not the buyer"),
        (status = 404, description = "Trade not found"),
        (status = 409, description = "Trade is not in completed status"),
        (status = 500, description = "Internal server error")
    ),
    tag = "trade"
)]
pub async fn refund(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(request): Json<RefundRequest>,
) -> Result<ApiResponse<RefundResponse>, ApiError> {
    let outcome = state.trades.refund(id, caller.0, request.reason).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(RefundResponse {
        refund_amount: outcome.refund_amount,
        new_balance: outcome.new_balance,
    }))
}

/// Rate request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RateRequest {
    /// Rating value (1-5)
    pub rating: u8,
    /// Optional comment
    pub comment: Option<String>,
}

/// Rate a completed trade as buyer or seller
#[utoipa::path(
    post,
    path = "/api/v1/trades/{id}/rate",
    params(
        ("id" = Uuid, Path, description = "Trade ID")
    ),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rating recorded successfully"),
        (status = 400, description = "Rating out of range"),
        (status = 401, description = "Missing caller identity"),
        (status = 403, description = "Caller is not a party to the trade"),
        (status = 404, description = "Trade not found"),
        (status = 409, description = "Caller already rated this trade"),
        (status = 500, description = "Internal server error")
    ),
    tag = "trade"
)]
pub async fn rate(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(request): Json<RateRequest>,
) -> Result<ApiResponse<TradeRating>, ApiError> {
    let rating = state.trades.rate(id, caller.0, request.rating, request.comment).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(rating))
}
