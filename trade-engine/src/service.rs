//! Trade engine service implementation

use std::sync::Arc;

use account_ledger::AccountService;
use chrono::Utc;
use common::decimal::{precision, Amount};
use common::error::{Error, Result, ErrorExt};
use common::model::account::AccountSummary;
use common::model::listing::ListingSummary;
use common::model::trade::{
    Trade, TradeDetail, TradeRating, TradeRole, TradeStatistics, TradeStatus,
};
use listing_catalog::ListingService;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::TradeEngineConfig;
use crate::locks::AccountLocks;
use crate::policy::{commission_for, refund_amount_for, refund_tier};
use crate::repository::{
    InMemoryTradeRepository, PostgresTradeRepository, TradeQuery, TradeRepository,
};

/// Result of a refund settlement
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    /// The refunded trade
    pub trade: Trade,
    /// Amount returned to the buyer
    pub refund_amount: Amount,
    /// Buyer balance after the refund
    pub new_balance: Amount,
}

/// Page of trade details plus the total match count
pub type TradeDetailPage = (Vec<TradeDetail>, usize);

/// Repository type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

/// Trade engine service owning the purchase/refund/rating state machine.
///
/// Every settlement operation validates all of its preconditions before the
/// first ledger mutation, and runs its mutations under per-account locks
/// acquired in ascending-id order.
pub struct TradeService {
    /// Repository for trade data
    repo: Arc<dyn TradeRepository>,
    /// Account ledger collaborator
    ledger: Arc<AccountService>,
    /// Listing catalog collaborator
    catalog: Arc<ListingService>,
    /// Commission and refund policy
    config: TradeEngineConfig,
    /// Per-account settlement locks
    locks: AccountLocks,
}

impl TradeService {
    /// Create a new trade service backed by the in-memory repository
    pub fn new(ledger: Arc<AccountService>, catalog: Arc<ListingService>) -> Self {
        Self::with_shared_repository(
            Arc::new(InMemoryTradeRepository::new()),
            ledger,
            catalog,
            TradeEngineConfig::default(),
        )
    }

    /// Create a new trade service with a specific repository type
    pub async fn with_repository(
        repo_type: RepositoryType,
        ledger: Arc<AccountService>,
        catalog: Arc<ListingService>,
        config: TradeEngineConfig,
    ) -> Result<Self> {
        let repo: Arc<dyn TradeRepository> = match repo_type {
            RepositoryType::InMemory => {
                Arc::new(InMemoryTradeRepository::new())
            },
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresTradeRepository::new(database_url).await?)
            }
        };

        Ok(Self::with_shared_repository(repo, ledger, catalog, config))
    }

    /// Create a new trade service over an existing repository
    pub fn with_shared_repository(
        repo: Arc<dyn TradeRepository>,
        ledger: Arc<AccountService>,
        catalog: Arc<ListingService>,
        config: TradeEngineConfig,
    ) -> Self {
        Self {
            repo,
            ledger,
            catalog,
            config,
            locks: AccountLocks::new(),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &TradeEngineConfig {
        &self.config
    }

    /// Purchase a listing.
    ///
    /// Creates the trade and settles it in the same call: the buyer is
    /// debited, the trade passes through pending, and settlement advances it
    /// to completed, crediting the seller net of commission. Every
    /// precondition failure rejects the purchase before any record changes.
    pub async fn purchase(
        &self,
        buyer_id: Uuid,
        listing_id: Uuid,
        message: Option<String>,
    ) -> Result<TradeDetail> {
        let listing = self.catalog.find_active(listing_id).await?;

        if listing.seller_id == buyer_id {
            return Err(Error::ValidationError(
                "Cannot purchase your own listing".to_string(),
            ));
        }

        // Serialize settlements touching either account
        let _guard = self.locks.lock_pair(buyer_id, listing.seller_id).await;

        if self.repo.find_open_purchase(buyer_id, listing_id).await?.is_some() {
            return Err(Error::StateConflict(
                "Listing already purchased or purchase is pending".to_string(),
            ));
        }

        let buyer = self.ledger.require_account(buyer_id).await?;
        if buyer.balance < listing.price {
            return Err(Error::InsufficientBalance(format!(
                "Balance {} is less than listing price {}",
                buyer.balance, listing.price
            )));
        }

        let commission = commission_for(listing.price, self.config.commission_rate);

        info!(
            "Purchase of listing {} by {} for {} (commission {})",
            listing_id, buyer_id, listing.price, commission
        );

        // Start a database transaction
        let transaction = self.repo.begin_transaction().await
            .with_context(|| format!("Failed to start transaction for listing {}", listing_id))?;

        let settlement_result = async {
            // Debit the buyer and record the spend
            self.ledger
                .adjust_balance(buyer_id, -listing.price, listing.price, Amount::ZERO)
                .await?;

            // Create the trade in pending status
            let trade = Trade::new(
                buyer_id,
                listing.seller_id,
                listing_id,
                listing.price,
                commission,
                message,
            );
            let trade = self.repo.insert_trade(trade).await?;

            // Settlement advances it to completed in the same call
            self.settle_completion(trade).await
        }.await;

        let trade = match settlement_result {
            Ok(trade) => {
                transaction.commit().await
                    .with_context(|| format!("Failed to commit purchase of listing {}", listing_id))?;
                trade
            },
            Err(e) => {
                error!("Error settling purchase of listing {}: {}", listing_id, e);

                if let Err(rollback_err) = transaction.rollback().await {
                    error!("Failed to roll back purchase transaction: {}", rollback_err);
                }

                return Err(e);
            }
        };

        self.build_detail(trade).await
    }

    /// Second half of a purchase: advance a pending trade to completed.
    ///
    /// Kept as its own step so an asynchronous payment confirmation could be
    /// inserted between creation and settlement without changing the public
    /// contract.
    async fn settle_completion(&self, mut trade: Trade) -> Result<Trade> {
        self.catalog.increment_purchase_count(trade.listing_id).await?;

        trade.status = TradeStatus::Completed;
        trade.completed_at = Some(Utc::now());
        trade.updated_at = Utc::now();
        let trade = self.repo.update_trade(trade).await?;

        // Credit the seller net of commission
        let earnings = trade.seller_earnings();
        self.ledger
            .adjust_balance(trade.seller_id, earnings, Amount::ZERO, earnings)
            .await?;

        Ok(trade)
    }

    /// Refund a completed trade under the tiered refund policy.
    ///
    /// Only the buyer may request a refund. Within the full-refund window the
    /// whole amount comes back; within the partial window, half; afterwards
    /// the request is rejected without touching any record. The seller is
    /// debited the refund minus the commission, clamped at zero balance.
    pub async fn refund(
        &self,
        trade_id: Uuid,
        requester_id: Uuid,
        reason: Option<String>,
    ) -> Result<RefundOutcome> {
        let mut trade = self.repo.get_trade(trade_id).await?
            .ok_or_else(|| Error::TradeNotFound(format!("Trade not found: {}", trade_id)))?;

        if trade.buyer_id != requester_id {
            return Err(Error::AuthorizationError(
                "Only the buyer can request a refund".to_string(),
            ));
        }

        if trade.status != TradeStatus::Completed {
            return Err(Error::StateConflict(
                "Only completed trades can be refunded".to_string(),
            ));
        }

        let completed_at = trade.completed_at.ok_or_else(|| {
            Error::Internal(format!("Completed trade {} has no completion time", trade_id))
        })?;

        let elapsed = Utc::now() - completed_at;
        let tier = refund_tier(elapsed, &self.config.refund_policy)
            .ok_or_else(|| Error::RefundWindowExpired(format!(
                "Refund window for trade {} has expired", trade_id
            )))?;
        let refund_amount = refund_amount_for(trade.amount, tier);

        info!(
            "Refunding trade {} ({:?} tier): {} back to buyer {}",
            trade_id, tier, refund_amount, trade.buyer_id
        );

        let _guard = self.locks.lock_pair(trade.buyer_id, trade.seller_id).await;

        let transaction = self.repo.begin_transaction().await
            .with_context(|| format!("Failed to start transaction for refund of trade {}", trade_id))?;

        let settlement_result = async {
            // Return funds to the buyer, reversing the recorded spend
            let buyer = self.ledger
                .adjust_balance(trade.buyer_id, refund_amount, -refund_amount, Amount::ZERO)
                .await?;

            // Claw back from the seller; the platform keeps the commission,
            // so the seller's deduction is the refund minus the commission
            let seller_deduction = refund_amount - trade.commission;
            self.ledger.deduct_earnings(trade.seller_id, seller_deduction).await?;

            trade.status = TradeStatus::Refunded;
            trade.refund_reason = reason.clone();
            trade.refund_amount = Some(refund_amount);
            trade.refunded_at = Some(Utc::now());
            trade.updated_at = Utc::now();
            let trade = self.repo.update_trade(trade.clone()).await?;

            Ok::<_, Error>((trade, buyer.balance))
        }.await;

        match settlement_result {
            Ok((trade, new_balance)) => {
                transaction.commit().await
                    .with_context(|| format!("Failed to commit refund of trade {}", trade_id))?;

                Ok(RefundOutcome {
                    trade,
                    refund_amount,
                    new_balance,
                })
            },
            Err(e) => {
                error!("Error refunding trade {}: {}", trade_id, e);

                if let Err(rollback_err) = transaction.rollback().await {
                    error!("Failed to roll back refund transaction: {}", rollback_err);
                }

                Err(e)
            }
        }
    }

    /// Rate a completed trade.
    ///
    /// Each party has one rating slot, settable exactly once; rating
    /// recomputes the counterparty's aggregate account rating over every
    /// rating they have received across all their trades.
    pub async fn rate(
        &self,
        trade_id: Uuid,
        requester_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> Result<TradeRating> {
        if !(1..=5).contains(&rating) {
            return Err(Error::ValidationError(format!(
                "Rating must be between 1 and 5: {}", rating
            )));
        }

        let mut trade = self.repo.get_trade(trade_id).await?
            .ok_or_else(|| Error::TradeNotFound(format!("Trade not found: {}", trade_id)))?;

        if trade.status != TradeStatus::Completed {
            return Err(Error::StateConflict(
                "Only completed trades can be rated".to_string(),
            ));
        }

        let is_buyer = trade.buyer_id == requester_id;
        let is_seller = trade.seller_id == requester_id;

        if !is_buyer && !is_seller {
            return Err(Error::AuthorizationError(
                "Not a party to this trade".to_string(),
            ));
        }

        if is_buyer {
            if trade.rating.buyer_rating.is_some() {
                return Err(Error::StateConflict(
                    "You have already rated this trade".to_string(),
                ));
            }
            trade.rating.buyer_rating = Some(rating);
            trade.rating.buyer_comment = comment;
        } else {
            if trade.rating.seller_rating.is_some() {
                return Err(Error::StateConflict(
                    "You have already rated this trade".to_string(),
                ));
            }
            trade.rating.seller_rating = Some(rating);
            trade.rating.seller_comment = comment;
        }

        trade.updated_at = Utc::now();
        let trade = self.repo.update_trade(trade).await?;

        debug!("Trade {} rated {} by {}", trade_id, rating, requester_id);

        // The rating lands on the counterparty's aggregate, not the rater's
        let target_id = if is_buyer { trade.seller_id } else { trade.buyer_id };
        self.recompute_user_rating(target_id).await?;

        Ok(trade.rating)
    }

    /// Recompute a user's aggregate rating from every rating they have
    /// received, as buyer and as seller combined
    async fn recompute_user_rating(&self, user_id: Uuid) -> Result<()> {
        let trades = self.repo.find_rated_involving(user_id).await?;

        let mut ratings: Vec<u8> = Vec::new();
        for trade in &trades {
            if trade.buyer_id == user_id {
                if let Some(r) = trade.rating.seller_rating {
                    ratings.push(r);
                }
            }
            if trade.seller_id == user_id {
                if let Some(r) = trade.rating.buyer_rating {
                    ratings.push(r);
                }
            }
        }

        if ratings.is_empty() {
            return Ok(());
        }

        let sum: u32 = ratings.iter().map(|r| *r as u32).sum();
        let average = precision::round_rating(
            Decimal::from(sum) / Decimal::from(ratings.len() as u32)
        );

        self.ledger.update_rating(user_id, average, ratings.len() as u32).await?;
        Ok(())
    }

    /// Cancel a pending trade, returning the full amount to the buyer.
    ///
    /// The primary purchase path settles in the same call, so this only
    /// applies to trades left pending by an interrupted settlement; it is an
    /// administrative operation and is not routed over HTTP.
    pub async fn cancel(&self, trade_id: Uuid, reason: Option<String>) -> Result<Trade> {
        let mut trade = self.repo.get_trade(trade_id).await?
            .ok_or_else(|| Error::TradeNotFound(format!("Trade not found: {}", trade_id)))?;

        if trade.status != TradeStatus::Pending {
            return Err(Error::StateConflict(
                "Only pending trades can be cancelled".to_string(),
            ));
        }

        info!("Cancelling pending trade {}", trade_id);

        let _guard = self.locks.lock_account(trade.buyer_id).await;

        // The buyer was debited at creation; return the full amount
        self.ledger
            .adjust_balance(trade.buyer_id, trade.amount, -trade.amount, Amount::ZERO)
            .await?;

        trade.status = TradeStatus::Cancelled;
        trade.refund_reason = reason;
        trade.refund_amount = Some(trade.amount);
        trade.refunded_at = Some(Utc::now());
        trade.updated_at = Utc::now();

        self.repo.update_trade(trade).await
    }

    /// Get a trade with its context attached; restricted to the two parties
    pub async fn trade_detail(&self, trade_id: Uuid, requester_id: Uuid) -> Result<TradeDetail> {
        let trade = self.repo.get_trade(trade_id).await?
            .ok_or_else(|| Error::TradeNotFound(format!("Trade not found: {}", trade_id)))?;

        if !trade.involves(requester_id) {
            return Err(Error::AuthorizationError(
                "Not a party to this trade".to_string(),
            ));
        }

        self.build_detail(trade).await
    }

    /// List trades where the user is the buyer, newest first
    pub async fn my_purchases(&self, buyer_id: Uuid, query: &TradeQuery) -> Result<TradeDetailPage> {
        let (trades, total) = self.repo.list_by_buyer(buyer_id, query).await?;
        Ok((self.build_details(trades).await?, total))
    }

    /// List trades where the user is the seller, newest first
    pub async fn my_sales(&self, seller_id: Uuid, query: &TradeQuery) -> Result<TradeDetailPage> {
        let (trades, total) = self.repo.list_by_seller(seller_id, query).await?;
        Ok((self.build_details(trades).await?, total))
    }

    /// Aggregate completed/refunded statistics for a user
    pub async fn statistics(&self, user_id: Uuid, role: TradeRole) -> Result<TradeStatistics> {
        self.repo.statistics(user_id, role).await
    }

    /// Attach buyer, seller, and listing summaries to a trade for display
    async fn build_detail(&self, trade: Trade) -> Result<TradeDetail> {
        let buyer = self.ledger.require_account(trade.buyer_id).await?;
        let seller = self.ledger.require_account(trade.seller_id).await?;
        let listing = self.catalog.get_listing(trade.listing_id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", trade.listing_id)))?;

        Ok(TradeDetail {
            buyer: AccountSummary::from(&buyer),
            seller: AccountSummary::from(&seller),
            listing: ListingSummary::from(&listing),
            trade,
        })
    }

    async fn build_details(&self, trades: Vec<Trade>) -> Result<Vec<TradeDetail>> {
        let mut details = Vec::with_capacity(trades.len());
        for trade in trades {
            details.push(self.build_detail(trade).await?);
        }
        Ok(details)
    }
}
