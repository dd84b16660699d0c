//! Commission and refund-window arithmetic.
//!
//! Kept as pure functions of elapsed time and amounts so the window
//! boundaries can be tested exactly, independent of the wall clock.

use chrono::Duration;
use common::decimal::{dec, precision, Amount};
use rust_decimal::Decimal;

use crate::config::RefundPolicy;

/// Refund tier granted for a given elapsed time since completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundTier {
    /// Full amount returned
    Full,
    /// Half the amount returned
    Partial,
}

/// Compute the platform commission for a trade amount
pub fn commission_for(amount: Amount, rate: Decimal) -> Amount {
    precision::round_money(amount * rate)
}

/// Determine the refund tier for the elapsed time since completion.
///
/// Both window boundaries are inclusive: a refund at exactly the full-refund
/// cutoff still returns the full amount, and one at exactly the partial
/// cutoff still returns half. Past the partial window there is no refund.
pub fn refund_tier(elapsed: Duration, policy: &RefundPolicy) -> Option<RefundTier> {
    if elapsed <= Duration::hours(policy.full_refund_hours) {
        Some(RefundTier::Full)
    } else if elapsed <= Duration::days(policy.partial_refund_days) {
        Some(RefundTier::Partial)
    } else {
        None
    }
}

/// Amount returned to the buyer for a refund in the given tier
pub fn refund_amount_for(amount: Amount, tier: RefundTier) -> Amount {
    match tier {
        RefundTier::Full => amount,
        RefundTier::Partial => precision::round_money(amount * dec!(0.5)),
    }
}
