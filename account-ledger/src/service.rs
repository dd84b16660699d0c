//! Account ledger service implementation

use std::sync::Arc;

use common::decimal::Amount;
use common::error::{Error, Result, ErrorExt};
use common::model::account::Account;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};

/// Account ledger service for managing user balances and spend/earn totals.
///
/// This service is the only writer of account money fields; the trade engine
/// drives every settlement mutation through `adjust_balance` and
/// `deduct_earnings` so that balance and the matching total always move
/// together.
pub struct AccountService {
    /// Repository for account data
    repo: Arc<dyn AccountRepository>,
}

/// Repository type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

impl AccountService {
    /// Create a new account service backed by the in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryAccountRepository::new()),
        }
    }

    /// Create a new account service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn AccountRepository> = match repo_type {
            RepositoryType::InMemory => {
                Arc::new(InMemoryAccountRepository::new())
            },
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresAccountRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo })
    }

    /// Create a new account service from a configuration
    pub async fn with_config(config: &crate::config::LedgerConfig) -> Result<Self> {
        let repo: Arc<dyn AccountRepository> = Arc::new(
            PostgresAccountRepository::with_config(config).await?
        );

        Ok(Self { repo })
    }

    /// Create a new account service over an existing repository
    pub fn with_shared_repository(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    /// Create a new account
    pub async fn create_account(&self, username: &str) -> Result<Account> {
        let username = username.trim();
        if username.len() < 3 || username.len() > 50 {
            return Err(Error::ValidationError(
                "Username must be between 3 and 50 characters".to_string(),
            ));
        }

        if self.repo.get_account_by_username(username).await?.is_some() {
            return Err(Error::StateConflict(format!("Username already taken: {}", username)));
        }

        info!("Creating new account: {}", username);
        self.repo.insert_account(Account::new(username.to_string())).await
    }

    /// Get an account by ID
    pub async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        self.repo.get_account(id).await
    }

    /// Get an account by ID, erroring when absent
    pub async fn require_account(&self, id: Uuid) -> Result<Account> {
        self.repo.get_account(id).await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))
    }

    /// Deposit funds into an account (top-up)
    pub async fn deposit(&self, account_id: Uuid, amount: Amount) -> Result<Account> {
        if amount <= Amount::ZERO {
            return Err(Error::ValidationError(format!("Deposit amount must be positive: {}", amount)));
        }

        info!("Depositing {} to account {}", amount, account_id);

        let mut account = self.require_account(account_id).await?;
        account.deposit(amount);

        self.repo.update_account(account).await
            .with_context(|| format!("Failed to update balance after deposit for account {}", account_id))
    }

    /// Apply a settlement adjustment to an account.
    ///
    /// `delta` moves the balance, `spent_delta` the spent total, and
    /// `earned_delta` the earned total; all three apply together or the call
    /// fails without touching the record. An adjustment that would drive the
    /// balance negative is rejected with an insufficient-balance error.
    pub async fn adjust_balance(
        &self,
        account_id: Uuid,
        delta: Amount,
        spent_delta: Amount,
        earned_delta: Amount,
    ) -> Result<Account> {
        debug!(
            "Adjusting account {}: balance delta {}, spent delta {}, earned delta {}",
            account_id, delta, spent_delta, earned_delta
        );

        let mut account = self.require_account(account_id).await?;

        account.adjust(delta, spent_delta, earned_delta).map_err(|e| {
            Error::InsufficientBalance(format!("Cannot adjust account {}: {}", account_id, e))
        })?;

        self.repo.update_account(account).await
            .with_context(|| format!("Failed to update account {} after adjustment", account_id))
    }

    /// Claw back sale proceeds from a seller on refund, clamping balance and
    /// earned total at zero when the seller cannot cover the deduction
    pub async fn deduct_earnings(&self, account_id: Uuid, amount: Amount) -> Result<Account> {
        debug!("Deducting {} of earnings from account {}", amount, account_id);

        let mut account = self.require_account(account_id).await?;
        account.deduct_earnings(amount);

        self.repo.update_account(account).await
            .with_context(|| format!("Failed to update account {} after earnings deduction", account_id))
    }

    /// Replace an account's aggregate rating
    pub async fn update_rating(&self, account_id: Uuid, average: Decimal, count: u32) -> Result<Account> {
        debug!("Updating rating of account {}: {} ({} ratings)", account_id, average, count);

        let mut account = self.require_account(account_id).await?;
        account.set_rating(average, count);

        self.repo.update_account(account).await
            .with_context(|| format!("Failed to update rating for account {}", account_id))
    }
}
