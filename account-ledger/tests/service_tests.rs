use account_ledger::{AccountService, InMemoryAccountRepository, RepositoryType};
use common::decimal::{Amount, dec};
use common::error::Error;
use common::model::account::Account;
use uuid::Uuid;

#[tokio::test]
async fn test_create_account() {
    let service = AccountService::new();
    let account = service.create_account("alice").await.unwrap();

    assert!(account.id != Uuid::nil());
    assert_eq!(account.username, "alice");
    assert_eq!(account.balance, Amount::ZERO);
    assert_eq!(account.total_spent, Amount::ZERO);
    assert_eq!(account.total_earned, Amount::ZERO);
    assert_eq!(account.rating.count, 0);
}

#[tokio::test]
async fn test_create_account_rejects_short_username() {
    let service = AccountService::new();
    let result = service.create_account("ab").await;

    match result {
        Err(Error::ValidationError(_)) => (),
        _ => panic!("Expected ValidationError"),
    }
}

#[tokio::test]
async fn test_create_account_rejects_duplicate_username() {
    let service = AccountService::new();
    service.create_account("alice").await.unwrap();

    let result = service.create_account("alice").await;
    match result {
        Err(Error::StateConflict(_)) => (),
        _ => panic!("Expected StateConflict"),
    }
}

#[tokio::test]
async fn test_get_account() {
    let service = AccountService::new();
    let account = service.create_account("alice").await.unwrap();

    let retrieved = service.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(retrieved.id, account.id);

    let non_existent = service.get_account(Uuid::new_v4()).await.unwrap();
    assert!(non_existent.is_none());
}

#[tokio::test]
async fn test_deposit() {
    let service = AccountService::new();
    let account = service.create_account("alice").await.unwrap();

    let account = service.deposit(account.id, dec!(100)).await.unwrap();
    assert_eq!(account.balance, dec!(100));

    // Deposits do not touch the settlement totals
    assert_eq!(account.total_spent, Amount::ZERO);
    assert_eq!(account.total_earned, Amount::ZERO);
}

#[tokio::test]
async fn test_deposit_rejects_non_positive_amount() {
    let service = AccountService::new();
    let account = service.create_account("alice").await.unwrap();

    assert!(matches!(
        service.deposit(account.id, dec!(0)).await,
        Err(Error::ValidationError(_))
    ));
    assert!(matches!(
        service.deposit(account.id, dec!(-5)).await,
        Err(Error::ValidationError(_))
    ));
}

#[tokio::test]
async fn test_adjust_balance_moves_all_fields_together() {
    let service = AccountService::new();
    let account = service.create_account("alice").await.unwrap();
    service.deposit(account.id, dec!(100)).await.unwrap();

    // Purchase-shaped adjustment
    let account = service
        .adjust_balance(account.id, dec!(-40), dec!(40), Amount::ZERO)
        .await
        .unwrap();
    assert_eq!(account.balance, dec!(60));
    assert_eq!(account.total_spent, dec!(40));

    // Sale-shaped adjustment
    let account = service
        .adjust_balance(account.id, dec!(38), Amount::ZERO, dec!(38))
        .await
        .unwrap();
    assert_eq!(account.balance, dec!(98));
    assert_eq!(account.total_earned, dec!(38));
}

#[tokio::test]
async fn test_adjust_balance_rejects_overdraft_without_mutation() {
    let service = AccountService::new();
    let account = service.create_account("alice").await.unwrap();
    service.deposit(account.id, dec!(10)).await.unwrap();

    let result = service
        .adjust_balance(account.id, dec!(-40), dec!(40), Amount::ZERO)
        .await;
    match result {
        Err(Error::InsufficientBalance(_)) => (),
        _ => panic!("Expected InsufficientBalance"),
    }

    // Nothing moved
    let account = service.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(account.balance, dec!(10));
    assert_eq!(account.total_spent, Amount::ZERO);
}

#[tokio::test]
async fn test_deduct_earnings_with_sufficient_balance() {
    let service = AccountService::new();
    let account = service.create_account("seller").await.unwrap();
    service.deposit(account.id, dec!(5)).await.unwrap();
    service
        .adjust_balance(account.id, dec!(38), Amount::ZERO, dec!(38))
        .await
        .unwrap();

    let account = service.deduct_earnings(account.id, dec!(18)).await.unwrap();
    assert_eq!(account.balance, dec!(25)); // 5 + 38 - 18
    assert_eq!(account.total_earned, dec!(20));
}

#[tokio::test]
async fn test_deduct_earnings_clamps_at_zero() {
    let service = AccountService::new();
    let account = service.create_account("seller").await.unwrap();
    service
        .adjust_balance(account.id, dec!(10), Amount::ZERO, dec!(10))
        .await
        .unwrap();

    // Seller already withdrew most of the money elsewhere; deduction exceeds
    // the current balance, so both fields clamp instead of going negative.
    service.adjust_balance(account.id, dec!(-8), Amount::ZERO, Amount::ZERO).await.unwrap();
    let account = service.deduct_earnings(account.id, dec!(18)).await.unwrap();

    assert_eq!(account.balance, Amount::ZERO);
    assert_eq!(account.total_earned, Amount::ZERO);
}

#[tokio::test]
async fn test_update_rating() {
    let service = AccountService::new();
    let account = service.create_account("seller").await.unwrap();

    let account = service.update_rating(account.id, dec!(4.5), 2).await.unwrap();
    assert_eq!(account.rating.average, dec!(4.5));
    assert_eq!(account.rating.count, 2);
}

#[tokio::test]
async fn test_shared_repository_is_visible_across_services() {
    use std::sync::Arc;

    let repo = Arc::new(InMemoryAccountRepository::new());
    let service = AccountService::with_shared_repository(repo.clone());

    let account = service.create_account("alice").await.unwrap();

    // The backing store sees what the service wrote
    assert!(repo.accounts.contains_key(&account.id));

    // And records seeded directly into the store are visible to the service
    let seeded = Account::new("bob".to_string());
    repo.accounts.insert(seeded.id, seeded.clone());
    assert!(service.get_account(seeded.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_with_repository_in_memory() {
    let service = AccountService::with_repository(RepositoryType::InMemory).await.unwrap();
    let account = service.create_account("carol").await.unwrap();
    assert_eq!(service.require_account(account.id).await.unwrap().username, "carol");
}
