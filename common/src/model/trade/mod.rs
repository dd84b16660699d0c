//! Trade models and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
use crate::model::account::AccountSummary;
use crate::model::listing::ListingSummary;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Trade lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum TradeStatus {
    /// Trade created, funds debited from the buyer, settlement not yet run
    Pending,
    /// Settled; seller credited, listing counter incremented
    Completed,
    /// Cancelled before completion; full amount returned to the buyer
    Cancelled,
    /// Refunded after completion under the tiered refund policy
    Refunded,
    /// Under dispute (terminal in the current flow)
    Disputed,
}

impl TradeStatus {
    /// Stable string form used for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Completed => "completed",
            TradeStatus::Cancelled => "cancelled",
            TradeStatus::Refunded => "refunded",
            TradeStatus::Disputed => "disputed",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TradeStatus::Pending),
            "completed" => Ok(TradeStatus::Completed),
            "cancelled" => Ok(TradeStatus::Cancelled),
            "refunded" => Ok(TradeStatus::Refunded),
            "disputed" => Ok(TradeStatus::Disputed),
            other => Err(format!("unknown trade status: {}", other)),
        }
    }
}

/// Per-party ratings on a trade.
///
/// Each slot is settable exactly once; the buyer slot never blocks the seller
/// slot and vice versa.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct TradeRating {
    /// Rating given by the buyer (1-5)
    pub buyer_rating: Option<u8>,
    /// Comment given by the buyer
    pub buyer_comment: Option<String>,
    /// Rating given by the seller (1-5)
    pub seller_rating: Option<u8>,
    /// Comment given by the seller
    pub seller_comment: Option<String>,
}

/// Trade model representing a single purchase of one listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Trade {
    /// Unique trade ID
    pub id: Uuid,
    /// Buyer account ID
    pub buyer_id: Uuid,
    /// Seller account ID (copied from the listing at creation)
    pub seller_id: Uuid,
    /// Listing being purchased
    pub listing_id: Uuid,
    /// Listing price snapshotted at purchase time; immutable thereafter
    pub amount: Amount,
    /// Platform fee (amount x commission rate), computed once at creation
    pub commission: Amount,
    /// Current lifecycle status
    pub status: TradeStatus,
    /// Optional message from the buyer, set at purchase time
    pub buyer_message: Option<String>,
    /// Reason supplied with a refund or cancellation
    pub refund_reason: Option<String>,
    /// Amount returned to the buyer on refund or cancellation
    pub refund_amount: Option<Amount>,
    /// Per-party ratings
    pub rating: TradeRating,
    /// Timestamp of settlement
    pub completed_at: Option<DateTime<Utc>>,
    /// Timestamp of refund or cancellation
    pub refunded_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// Create a new pending trade for a listing purchase
    pub fn new(
        buyer_id: Uuid,
        seller_id: Uuid,
        listing_id: Uuid,
        amount: Amount,
        commission: Amount,
        buyer_message: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            buyer_id,
            seller_id,
            listing_id,
            amount,
            commission,
            status: TradeStatus::Pending,
            buyer_message,
            refund_reason: None,
            refund_amount: None,
            rating: TradeRating::default(),
            completed_at: None,
            refunded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given user is a party to this trade
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }

    /// Net proceeds credited to the seller on completion
    pub fn seller_earnings(&self) -> Amount {
        self.amount - self.commission
    }
}

/// Trade with buyer, seller, and listing context attached for display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct TradeDetail {
    /// The trade record
    pub trade: Trade,
    /// Buyer summary
    pub buyer: AccountSummary,
    /// Seller summary
    pub seller: AccountSummary,
    /// Listing summary
    pub listing: ListingSummary,
}

/// Which side of past trades to aggregate over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum TradeRole {
    Buyer,
    Seller,
    #[default]
    Both,
}

/// Aggregate trade statistics for a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct TradeStatistics {
    /// Completed plus refunded trades
    pub total_trades: u64,
    /// Trades currently in completed status
    pub completed_trades: u64,
    /// Trades currently in refunded status
    pub refunded_trades: u64,
    /// Sum of trade amounts over completed trades
    pub total_amount: Amount,
    /// Sum of trade amounts over refunded trades
    pub refunded_amount: Amount,
}
