//! Configuration for the trade engine

use std::env;

use common::decimal::dec;
use rust_decimal::Decimal;

/// Elapsed-time tiers governing refund eligibility after completion
#[derive(Debug, Clone)]
pub struct RefundPolicy {
    /// Refunds within this many hours of completion return the full amount
    pub full_refund_hours: i64,
    /// Refunds within this many days of completion return half the amount
    pub partial_refund_days: i64,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            full_refund_hours: 24,
            partial_refund_days: 7,
        }
    }
}

/// Configuration for the trade engine
#[derive(Debug, Clone)]
pub struct TradeEngineConfig {
    /// Platform fee as a fraction of the trade amount
    pub commission_rate: Decimal,
    /// Refund window tiers
    pub refund_policy: RefundPolicy,
}

impl Default for TradeEngineConfig {
    fn default() -> Self {
        Self {
            commission_rate: dec!(0.05),
            refund_policy: RefundPolicy::default(),
        }
    }
}

impl TradeEngineConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            commission_rate: env::var("COMMISSION_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.commission_rate),
            refund_policy: RefundPolicy {
                full_refund_hours: env::var("FULL_REFUND_HOURS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.refund_policy.full_refund_hours),
                partial_refund_days: env::var("PARTIAL_REFUND_DAYS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.refund_policy.partial_refund_days),
            },
        }
    }
}
