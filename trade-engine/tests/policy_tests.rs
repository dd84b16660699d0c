use chrono::Duration;
use common::decimal::dec;
use trade_engine::{commission_for, refund_amount_for, refund_tier, RefundPolicy, RefundTier};

#[test]
fn test_commission_rounding() {
    assert_eq!(commission_for(dec!(40), dec!(0.05)), dec!(2.00));
    assert_eq!(commission_for(dec!(100), dec!(0.05)), dec!(5.00));
    // Rounded to money precision
    assert_eq!(commission_for(dec!(0.99), dec!(0.05)), dec!(0.05));
    assert_eq!(commission_for(dec!(0), dec!(0.05)), dec!(0));
}

#[test]
fn test_full_refund_window_is_inclusive() {
    let policy = RefundPolicy::default();

    assert_eq!(
        refund_tier(Duration::hours(23) + Duration::minutes(59), &policy),
        Some(RefundTier::Full)
    );
    // Exactly 24h still qualifies for the full tier
    assert_eq!(refund_tier(Duration::hours(24), &policy), Some(RefundTier::Full));
    assert_eq!(
        refund_tier(Duration::hours(24) + Duration::seconds(1), &policy),
        Some(RefundTier::Partial)
    );
}

#[test]
fn test_partial_refund_window_is_inclusive() {
    let policy = RefundPolicy::default();

    assert_eq!(refund_tier(Duration::hours(25), &policy), Some(RefundTier::Partial));
    assert_eq!(refund_tier(Duration::days(2), &policy), Some(RefundTier::Partial));
    // Exactly 7d still qualifies for the partial tier
    assert_eq!(refund_tier(Duration::days(7), &policy), Some(RefundTier::Partial));
    assert_eq!(
        refund_tier(Duration::days(7) + Duration::seconds(1), &policy),
        None
    );
    assert_eq!(refund_tier(Duration::days(8), &policy), None);
}

#[test]
fn test_custom_policy_windows() {
    let policy = RefundPolicy {
        full_refund_hours: 1,
        partial_refund_days: 2,
    };

    assert_eq!(refund_tier(Duration::minutes(59), &policy), Some(RefundTier::Full));
    assert_eq!(refund_tier(Duration::hours(2), &policy), Some(RefundTier::Partial));
    assert_eq!(refund_tier(Duration::days(3), &policy), None);
}

#[test]
fn test_refund_amounts() {
    assert_eq!(refund_amount_for(dec!(40), RefundTier::Full), dec!(40));
    assert_eq!(refund_amount_for(dec!(40), RefundTier::Partial), dec!(20.00));
    // Half of an odd cent amount rounds to money precision
    assert_eq!(refund_amount_for(dec!(0.01), RefundTier::Partial), dec!(0.00));
    assert_eq!(refund_amount_for(dec!(10.01), RefundTier::Partial), dec!(5.00));
}
