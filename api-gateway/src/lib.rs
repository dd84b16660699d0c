// api-gateway/src/lib.rs
pub mod api;
pub mod auth;
pub mod config;
pub mod error;

use std::sync::Arc;

use account_ledger::AccountService;
use listing_catalog::ListingService;
use trade_engine::TradeService;

/// App state shared across handlers
pub struct AppState {
    /// Account ledger service
    pub ledger: Arc<AccountService>,
    /// Listing catalog service
    pub catalog: Arc<ListingService>,
    /// Trade engine service
    pub trades: Arc<TradeService>,
}
