//! Decimal type utilities for precise monetary calculations

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Price type with high precision
pub type Price = Decimal;

/// Amount type with high precision (money values on accounts and trades)
pub type Amount = Decimal;

/// Precision helpers for common operations
pub mod precision {
    use super::*;

    /// Money precision (2 decimal places)
    pub const MONEY_PRECISION: u32 = 2;

    /// Aggregate rating precision (1 decimal place)
    pub const RATING_PRECISION: u32 = 1;

    /// Round a money amount to standard precision
    pub fn round_money(amount: Amount) -> Amount {
        amount.round_dp(MONEY_PRECISION)
    }

    /// Round an aggregate rating to standard precision
    pub fn round_rating(value: Decimal) -> Decimal {
        value.round_dp(RATING_PRECISION)
    }
}
