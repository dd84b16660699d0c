//! Account models and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Aggregate rating received by a user across all their trades
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct RatingSummary {
    /// Arithmetic mean of received ratings, rounded to one decimal place
    pub average: Decimal,
    /// Number of ratings received
    pub count: u32,
}

/// Account model
///
/// The balance and the spent/earned totals are mutated exclusively by trade
/// settlement and the deposit operation. The balance never goes negative: an
/// operation that would overdraw is rejected before any field is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
    /// Display name
    pub username: String,
    /// Current balance
    pub balance: Amount,
    /// Cumulative amount spent on purchases (refunds subtract from it)
    pub total_spent: Amount,
    /// Cumulative amount earned from sales (refunds subtract from it)
    pub total_earned: Amount,
    /// Aggregate rating received from counterparties
    pub rating: RatingSummary,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balances
    pub fn new(username: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            balance: Amount::ZERO,
            total_spent: Amount::ZERO,
            total_earned: Amount::ZERO,
            rating: RatingSummary::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add funds to the balance (top-up)
    pub fn deposit(&mut self, amount: Amount) {
        self.balance += amount;
        self.updated_at = Utc::now();
    }

    /// Apply a ledger adjustment from a trade operation.
    ///
    /// The three deltas are applied together or not at all; an adjustment
    /// that would drive the balance negative is rejected without touching
    /// any field.
    pub fn adjust(
        &mut self,
        delta: Amount,
        spent_delta: Amount,
        earned_delta: Amount,
    ) -> Result<(), String> {
        let new_balance = self.balance + delta;
        if new_balance < Amount::ZERO {
            return Err(format!("insufficient balance: {} + {}", self.balance, delta));
        }

        self.balance = new_balance;
        self.total_spent += spent_delta;
        self.total_earned += earned_delta;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Claw back sale proceeds from a seller on refund.
    ///
    /// If the seller's balance cannot cover the deduction, balance and the
    /// earned total are clamped at zero and the shortfall is absorbed.
    pub fn deduct_earnings(&mut self, amount: Amount) {
        if self.balance >= amount {
            self.balance -= amount;
            self.total_earned -= amount;
        } else {
            self.balance = Amount::ZERO;
            self.total_earned = (self.total_earned - amount).max(Amount::ZERO);
        }
        self.updated_at = Utc::now();
    }

    /// Replace the aggregate rating
    pub fn set_rating(&mut self, average: Decimal, count: u32) {
        self.rating = RatingSummary { average, count };
        self.updated_at = Utc::now();
    }
}

/// Short account representation attached to trade detail responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct AccountSummary {
    /// Account ID
    pub id: Uuid,
    /// Display name
    pub username: String,
    /// Aggregate rating
    pub rating: RatingSummary,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            rating: account.rating.clone(),
        }
    }
}
