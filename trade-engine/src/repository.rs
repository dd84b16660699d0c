//! Repository for trade data

use std::str::FromStr;

use async_trait::async_trait;
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::trade::{Trade, TradeRating, TradeRole, TradeStatistics, TradeStatus};
use common::{DBTransaction, TransactionManager};
use common::db::{PgTransactionManager, InMemoryTransactionManager};
use dashmap::DashMap;
use serde::Deserialize;
use sqlx::{PgPool, postgres::PgPoolOptions, postgres::PgRow, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Default page size for trade queries
const DEFAULT_PAGE_LIMIT: usize = 20;
/// Upper bound on page size
const MAX_PAGE_LIMIT: usize = 100;

/// Page of trades plus the total match count
pub type TradePage = (Vec<Trade>, usize);

/// Pagination and filter parameters for trade queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<TradeStatus>,
}

impl TradeQuery {
    /// Resolve the page/limit pair to an offset and clamped limit
    pub fn to_offset_limit(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        ((page - 1) * limit, limit)
    }
}

/// Trade repository trait defining the interface for trade storage
#[async_trait]
pub trait TradeRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Insert a new trade
    async fn insert_trade(&self, trade: Trade) -> Result<Trade>;

    /// Get a trade by ID
    async fn get_trade(&self, id: Uuid) -> Result<Option<Trade>>;

    /// Persist an updated trade record
    async fn update_trade(&self, trade: Trade) -> Result<Trade>;

    /// Find a pending or completed trade by this buyer against this listing
    /// (the duplicate-purchase guard)
    async fn find_open_purchase(&self, buyer_id: Uuid, listing_id: Uuid) -> Result<Option<Trade>>;

    /// List trades where the user is the buyer, newest first
    async fn list_by_buyer(&self, buyer_id: Uuid, query: &TradeQuery) -> Result<TradePage>;

    /// List trades where the user is the seller, newest first
    async fn list_by_seller(&self, seller_id: Uuid, query: &TradeQuery) -> Result<TradePage>;

    /// Trades contributing to the user's received-rating pool: trades where
    /// the user bought and the seller rated, or sold and the buyer rated
    async fn find_rated_involving(&self, user_id: Uuid) -> Result<Vec<Trade>>;

    /// Aggregate completed/refunded statistics for a user in the given role
    async fn statistics(&self, user_id: Uuid, role: TradeRole) -> Result<TradeStatistics>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

fn accumulate(stats: &mut TradeStatistics, trade: &Trade) {
    match trade.status {
        TradeStatus::Completed => {
            stats.completed_trades += 1;
            stats.total_amount += trade.amount;
        }
        TradeStatus::Refunded => {
            stats.refunded_trades += 1;
            stats.refunded_amount += trade.amount;
        }
        _ => return,
    }
    stats.total_trades = stats.completed_trades + stats.refunded_trades;
}

fn role_matches(trade: &Trade, user_id: Uuid, role: TradeRole) -> bool {
    match role {
        TradeRole::Buyer => trade.buyer_id == user_id,
        TradeRole::Seller => trade.seller_id == user_id,
        TradeRole::Both => trade.involves(user_id),
    }
}

/// In-memory repository for trade data
pub struct InMemoryTradeRepository {
    /// Trades by ID
    pub trades: DashMap<Uuid, Trade>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryTradeRepository {
    /// Create a new in-memory trade repository
    pub fn new() -> Self {
        Self {
            trades: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }

    fn page_matching<F>(&self, predicate: F, query: &TradeQuery) -> TradePage
    where
        F: Fn(&Trade) -> bool,
    {
        let mut matched: Vec<Trade> = self.trades
            .iter()
            .filter(|entry| {
                let trade = entry.value();
                predicate(trade) && query.status.map_or(true, |s| trade.status == s)
            })
            .map(|entry| entry.value().clone())
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len();
        let (offset, limit) = query.to_offset_limit();
        let page = matched.into_iter().skip(offset).take(limit).collect();
        (page, total)
    }
}

#[async_trait]
impl TradeRepository for InMemoryTradeRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn insert_trade(&self, trade: Trade) -> Result<Trade> {
        self.trades.insert(trade.id, trade.clone());
        Ok(trade)
    }

    async fn get_trade(&self, id: Uuid) -> Result<Option<Trade>> {
        Ok(self.trades.get(&id).map(|t| t.clone()))
    }

    async fn update_trade(&self, trade: Trade) -> Result<Trade> {
        if !self.trades.contains_key(&trade.id) {
            return Err(Error::TradeNotFound(format!("Trade not found: {}", trade.id)));
        }

        self.trades.insert(trade.id, trade.clone());
        Ok(trade)
    }

    async fn find_open_purchase(&self, buyer_id: Uuid, listing_id: Uuid) -> Result<Option<Trade>> {
        let found = self.trades
            .iter()
            .find(|entry| {
                let trade = entry.value();
                trade.buyer_id == buyer_id
                    && trade.listing_id == listing_id
                    && matches!(trade.status, TradeStatus::Pending | TradeStatus::Completed)
            })
            .map(|entry| entry.value().clone());

        Ok(found)
    }

    async fn list_by_buyer(&self, buyer_id: Uuid, query: &TradeQuery) -> Result<TradePage> {
        Ok(self.page_matching(|t| t.buyer_id == buyer_id, query))
    }

    async fn list_by_seller(&self, seller_id: Uuid, query: &TradeQuery) -> Result<TradePage> {
        Ok(self.page_matching(|t| t.seller_id == seller_id, query))
    }

    async fn find_rated_involving(&self, user_id: Uuid) -> Result<Vec<Trade>> {
        let matched = self.trades
            .iter()
            .filter(|entry| {
                let trade = entry.value();
                (trade.buyer_id == user_id && trade.rating.seller_rating.is_some())
                    || (trade.seller_id == user_id && trade.rating.buyer_rating.is_some())
            })
            .map(|entry| entry.value().clone())
            .collect();

        Ok(matched)
    }

    async fn statistics(&self, user_id: Uuid, role: TradeRole) -> Result<TradeStatistics> {
        let mut stats = TradeStatistics::default();

        for entry in self.trades.iter() {
            let trade = entry.value();
            if role_matches(trade, user_id, role) {
                accumulate(&mut stats, trade);
            }
        }

        Ok(stats)
    }
}

/// PostgreSQL repository for trade data
pub struct PostgresTradeRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresTradeRepository {
    /// Create a new PostgreSQL trade repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?,
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }

    async fn page_where(&self, column: &str, user_id: Uuid, query: &TradeQuery) -> Result<TradePage> {
        let status = query.status.map(|s| s.as_str().to_string());
        let (offset, limit) = query.to_offset_limit();

        let rows = sqlx::query(
            &format!(
                "SELECT {} FROM trades
                 WHERE {} = $1 AND ($2::varchar IS NULL OR status = $2)
                 ORDER BY created_at DESC
                 LIMIT $3 OFFSET $4",
                TRADE_COLUMNS, column
            )
        )
        .bind(user_id)
        .bind(&status)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            &format!(
                "SELECT COUNT(*) FROM trades
                 WHERE {} = $1 AND ($2::varchar IS NULL OR status = $2)",
                column
            )
        )
        .bind(user_id)
        .bind(&status)
        .fetch_one(&self.pool)
        .await?;

        let mut trades = Vec::with_capacity(rows.len());
        for row in rows {
            trades.push(row_to_trade(&row)?);
        }

        Ok((trades, total as usize))
    }
}

const TRADE_COLUMNS: &str =
    "id, buyer_id, seller_id, listing_id, amount, commission, status,
     buyer_message, refund_reason, refund_amount,
     buyer_rating, buyer_comment, seller_rating, seller_comment,
     completed_at, refunded_at, created_at, updated_at";

/// Parse a money column stored as text
fn parse_amount(raw: String, column: &str) -> Result<Amount> {
    raw.parse::<Amount>()
        .map_err(|e| Error::Internal(format!("Invalid {} format: {}", column, e)))
}

/// Convert a trade row into the domain model
fn row_to_trade(row: &PgRow) -> Result<Trade> {
    let status_str: String = row.get("status");
    let status = TradeStatus::from_str(&status_str)
        .map_err(Error::Internal)?;

    let refund_amount: Option<String> = row.get("refund_amount");
    let refund_amount = match refund_amount {
        Some(raw) => Some(parse_amount(raw, "refund_amount")?),
        None => None,
    };

    let buyer_rating: Option<i16> = row.get("buyer_rating");
    let seller_rating: Option<i16> = row.get("seller_rating");

    Ok(Trade {
        id: row.get("id"),
        buyer_id: row.get("buyer_id"),
        seller_id: row.get("seller_id"),
        listing_id: row.get("listing_id"),
        amount: parse_amount(row.get("amount"), "amount")?,
        commission: parse_amount(row.get("commission"), "commission")?,
        status,
        buyer_message: row.get("buyer_message"),
        refund_reason: row.get("refund_reason"),
        refund_amount,
        rating: TradeRating {
            buyer_rating: buyer_rating.map(|r| r as u8),
            buyer_comment: row.get("buyer_comment"),
            seller_rating: seller_rating.map(|r| r as u8),
            seller_comment: row.get("seller_comment"),
        },
        completed_at: row.get("completed_at"),
        refunded_at: row.get("refunded_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl TradeRepository for PostgresTradeRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn insert_trade(&self, trade: Trade) -> Result<Trade> {
        debug!("Creating new trade in database: {}", trade.id);

        sqlx::query(
            "INSERT INTO trades
                (id, buyer_id, seller_id, listing_id, amount, commission, status,
                 buyer_message, refund_reason, refund_amount,
                 buyer_rating, buyer_comment, seller_rating, seller_comment,
                 completed_at, refunded_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                     $11, $12, $13, $14, $15, $16, $17, $18)"
        )
        .bind(trade.id)
        .bind(trade.buyer_id)
        .bind(trade.seller_id)
        .bind(trade.listing_id)
        .bind(trade.amount.to_string())
        .bind(trade.commission.to_string())
        .bind(trade.status.as_str())
        .bind(&trade.buyer_message)
        .bind(&trade.refund_reason)
        .bind(trade.refund_amount.map(|a| a.to_string()))
        .bind(trade.rating.buyer_rating.map(|r| r as i16))
        .bind(&trade.rating.buyer_comment)
        .bind(trade.rating.seller_rating.map(|r| r as i16))
        .bind(&trade.rating.seller_comment)
        .bind(trade.completed_at)
        .bind(trade.refunded_at)
        .bind(trade.created_at)
        .bind(trade.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(trade)
    }

    async fn get_trade(&self, id: Uuid) -> Result<Option<Trade>> {
        debug!("Getting trade from database: {}", id);

        let row = sqlx::query(
            &format!("SELECT {} FROM trades WHERE id = $1", TRADE_COLUMNS)
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_trade(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_trade(&self, trade: Trade) -> Result<Trade> {
        debug!("Updating trade in database: {}", trade.id);

        let result = sqlx::query(
            "UPDATE trades SET
                status = $2,
                refund_reason = $3,
                refund_amount = $4,
                buyer_rating = $5,
                buyer_comment = $6,
                seller_rating = $7,
                seller_comment = $8,
                completed_at = $9,
                refunded_at = $10,
                updated_at = $11
             WHERE id = $1"
        )
        .bind(trade.id)
        .bind(trade.status.as_str())
        .bind(&trade.refund_reason)
        .bind(trade.refund_amount.map(|a| a.to_string()))
        .bind(trade.rating.buyer_rating.map(|r| r as i16))
        .bind(&trade.rating.buyer_comment)
        .bind(trade.rating.seller_rating.map(|r| r as i16))
        .bind(&trade.rating.seller_comment)
        .bind(trade.completed_at)
        .bind(trade.refunded_at)
        .bind(trade.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::TradeNotFound(format!("Trade not found: {}", trade.id)));
        }

        Ok(trade)
    }

    async fn find_open_purchase(&self, buyer_id: Uuid, listing_id: Uuid) -> Result<Option<Trade>> {
        let row = sqlx::query(
            &format!(
                "SELECT {} FROM trades
                 WHERE buyer_id = $1 AND listing_id = $2
                   AND status IN ('pending', 'completed')
                 LIMIT 1",
                TRADE_COLUMNS
            )
        )
        .bind(buyer_id)
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_trade(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_buyer(&self, buyer_id: Uuid, query: &TradeQuery) -> Result<TradePage> {
        self.page_where("buyer_id", buyer_id, query).await
    }

    async fn list_by_seller(&self, seller_id: Uuid, query: &TradeQuery) -> Result<TradePage> {
        self.page_where("seller_id", seller_id, query).await
    }

    async fn find_rated_involving(&self, user_id: Uuid) -> Result<Vec<Trade>> {
        let rows = sqlx::query(
            &format!(
                "SELECT {} FROM trades
                 WHERE (buyer_id = $1 AND seller_rating IS NOT NULL)
                    OR (seller_id = $1 AND buyer_rating IS NOT NULL)",
                TRADE_COLUMNS
            )
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut trades = Vec::with_capacity(rows.len());
        for row in rows {
            trades.push(row_to_trade(&row)?);
        }

        Ok(trades)
    }

    async fn statistics(&self, user_id: Uuid, role: TradeRole) -> Result<TradeStatistics> {
        let rows = sqlx::query(
            &format!(
                "SELECT {} FROM trades
                 WHERE (buyer_id = $1 OR seller_id = $1)
                   AND status IN ('completed', 'refunded')",
                TRADE_COLUMNS
            )
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = TradeStatistics::default();
        for row in rows {
            let trade = row_to_trade(&row)?;
            if role_matches(&trade, user_id, role) {
                accumulate(&mut stats, &trade);
            }
        }

        Ok(stats)
    }
}
