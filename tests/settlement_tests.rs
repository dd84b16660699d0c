// File: tests/settlement_tests.rs
//
// End-to-end settlement scenarios across the assembled services, run against
// the in-memory repositories.

use std::sync::Arc;

use account_ledger::AccountService;
use chrono::{Duration, Utc};
use common::decimal::{dec, Amount};
use common::model::listing::Category;
use common::model::trade::TradeStatus;
use listing_catalog::{ListingService, NewListing};
use trade_engine::{InMemoryTradeRepository, TradeEngineConfig, TradeService};

struct Marketplace {
    ledger: Arc<AccountService>,
    catalog: Arc<ListingService>,
    trades: Arc<InMemoryTradeRepository>,
    engine: TradeService,
}

fn marketplace() -> Marketplace {
    let ledger = Arc::new(AccountService::new());
    let catalog = Arc::new(ListingService::new());
    let trades = Arc::new(InMemoryTradeRepository::new());
    let engine = TradeService::with_shared_repository(
        trades.clone(),
        ledger.clone(),
        catalog.clone(),
        TradeEngineConfig::default(),
    );

    Marketplace { ledger, catalog, trades, engine }
}

// Buyer with balance 100 purchases a 40.00 listing at the default 5%
// commission: buyer ends at 60, seller gains 38, the stored commission is
// exactly 2.00, and the trade settles to completed within the call.
#[tokio::test]
async fn purchase_end_to_end() {
    let m = marketplace();

    let buyer = m.ledger.create_account("buyer").await.unwrap();
    m.ledger.deposit(buyer.id, dec!(100)).await.unwrap();
    let seller = m.ledger.create_account("seller").await.unwrap();

    let listing = m.catalog
        .create_listing(
            seller.id,
            NewListing {
                title: "Quarterly market analysis".to_string(),
                description: "Full dataset and writeup".to_string(),
                category: Category::Investment,
                price: dec!(40),
            },
        )
        .await
        .unwrap();

    let detail = m.engine
        .purchase(buyer.id, listing.id, Some("Looking forward to it".to_string()))
        .await
        .unwrap();

    assert_eq!(detail.trade.status, TradeStatus::Completed);
    assert_eq!(detail.trade.commission, dec!(2.00));
    assert_eq!(detail.listing.price, dec!(40));
    assert_eq!(detail.seller.username, "seller");

    let buyer = m.ledger.require_account(buyer.id).await.unwrap();
    let seller = m.ledger.require_account(seller.id).await.unwrap();
    assert_eq!(buyer.balance, dec!(60));
    assert_eq!(seller.balance, dec!(38));

    assert_eq!(m.catalog.get_listing(listing.id).await.unwrap().unwrap().purchases, 1);
}

// The same trade refunded two days after completion lands in the 50% tier:
// the buyer gets 20.00 back (balance 80), the seller gives up
// 20.00 - 2.00 = 18.00.
#[tokio::test]
async fn refund_end_to_end_partial_tier() {
    let m = marketplace();

    let buyer = m.ledger.create_account("buyer").await.unwrap();
    m.ledger.deposit(buyer.id, dec!(100)).await.unwrap();
    let seller = m.ledger.create_account("seller").await.unwrap();

    let listing = m.catalog
        .create_listing(
            seller.id,
            NewListing {
                title: "Quarterly market analysis".to_string(),
                description: "Full dataset and writeup".to_string(),
                category: Category::Investment,
                price: dec!(40),
            },
        )
        .await
        .unwrap();

    let detail = m.engine.purchase(buyer.id, listing.id, None).await.unwrap();

    // Two days pass
    {
        let mut trade = m.trades.trades.get_mut(&detail.trade.id).unwrap();
        trade.completed_at = Some(Utc::now() - Duration::days(2));
    }

    let outcome = m.engine
        .refund(detail.trade.id, buyer.id, Some("changed my mind".to_string()))
        .await
        .unwrap();

    assert_eq!(outcome.refund_amount, dec!(20.00));
    assert_eq!(outcome.new_balance, dec!(80));
    assert_eq!(outcome.trade.status, TradeStatus::Refunded);

    let seller = m.ledger.require_account(seller.id).await.unwrap();
    assert_eq!(seller.balance, dec!(20)); // 38 - 18
    assert_eq!(seller.total_earned, dec!(20));
}

// Full lifecycle: purchase, mutual rating, and a second buyer moving the
// seller's aggregate. Money and rating aggregates stay consistent throughout.
#[tokio::test]
async fn trade_lifecycle_with_ratings() {
    let m = marketplace();

    let seller = m.ledger.create_account("seller").await.unwrap();
    let alice = m.ledger.create_account("alice").await.unwrap();
    let bob = m.ledger.create_account("bob").await.unwrap();
    m.ledger.deposit(alice.id, dec!(50)).await.unwrap();
    m.ledger.deposit(bob.id, dec!(50)).await.unwrap();

    let listing_for = |title: &str| NewListing {
        title: title.to_string(),
        description: "d".to_string(),
        category: Category::Technology,
        price: dec!(10),
    };

    let first = m.catalog.create_listing(seller.id, listing_for("First")).await.unwrap();
    let second = m.catalog.create_listing(seller.id, listing_for("Second")).await.unwrap();

    let alice_trade = m.engine.purchase(alice.id, first.id, None).await.unwrap();
    let bob_trade = m.engine.purchase(bob.id, second.id, None).await.unwrap();

    m.engine.rate(alice_trade.trade.id, alice.id, 5, Some("excellent".to_string())).await.unwrap();
    m.engine.rate(bob_trade.trade.id, bob.id, 4, None).await.unwrap();

    // Seller rated 5 and 4 across two trades
    let seller_account = m.ledger.require_account(seller.id).await.unwrap();
    assert_eq!(seller_account.rating.average, dec!(4.5));
    assert_eq!(seller_account.rating.count, 2);

    // The seller rates Alice back; her aggregate moves, Bob's does not
    m.engine.rate(alice_trade.trade.id, seller.id, 5, None).await.unwrap();
    let alice_account = m.ledger.require_account(alice.id).await.unwrap();
    assert_eq!(alice_account.rating.average, dec!(5.0));
    assert_eq!(alice_account.rating.count, 1);
    assert_eq!(m.ledger.require_account(bob.id).await.unwrap().rating.count, 0);

    // Seller earned 2 x (10 - 0.50)
    let seller_account = m.ledger.require_account(seller.id).await.unwrap();
    assert_eq!(seller_account.balance, dec!(19.00));
    assert_eq!(seller_account.total_earned, dec!(19.00));

    // Money never left the system: total balances equal total deposits
    let total: Amount = seller_account.balance
        + m.ledger.require_account(alice.id).await.unwrap().balance
        + m.ledger.require_account(bob.id).await.unwrap().balance;
    // 100 deposited, 2 x 0.50 retained by the platform
    assert_eq!(total, dec!(99.00));
}
