//! Repository for account data

use async_trait::async_trait;
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::account::Account;
use common::{DBTransaction, TransactionManager};
use common::db::{PgTransactionManager, InMemoryTransactionManager};
use dashmap::DashMap;
use rust_decimal::Decimal;
use sqlx::{PgPool, postgres::PgPoolOptions, postgres::PgRow, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Account repository trait defining the interface for account storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Insert a new account
    async fn insert_account(&self, account: Account) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Get an account by username
    async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Persist an updated account record
    async fn update_account(&self, account: Account) -> Result<Account>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for account data
pub struct InMemoryAccountRepository {
    /// Accounts by ID
    pub accounts: DashMap<Uuid, Account>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryAccountRepository {
    /// Create a new in-memory account repository
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn insert_account(&self, account: Account) -> Result<Account> {
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let found = self.accounts
            .iter()
            .find(|entry| entry.value().username == username)
            .map(|entry| entry.value().clone());

        Ok(found)
    }

    async fn update_account(&self, account: Account) -> Result<Account> {
        if !self.accounts.contains_key(&account.id) {
            return Err(Error::AccountNotFound(format!("Account not found: {}", account.id)));
        }

        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }
}

/// PostgreSQL repository for account data
pub struct PostgresAccountRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresAccountRepository {
    /// Create a new PostgreSQL account repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?,
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }

    /// Create a new PostgreSQL account repository with configuration
    pub async fn with_config(config: &crate::config::LedgerConfig) -> Result<Self> {
        info!("Connecting to PostgreSQL database with pool size: {}", config.db_pool_size);

        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }
}

/// Parse a money column stored as text
fn parse_amount(row: &PgRow, column: &str) -> Result<Amount> {
    let raw: String = row.get(column);
    raw.parse::<Amount>()
        .map_err(|e| Error::Internal(format!("Invalid {} format: {}", column, e)))
}

/// Convert an account row into the domain model
fn row_to_account(row: &PgRow) -> Result<Account> {
    let rating_average: String = row.get("rating_average");
    let rating_average = rating_average.parse::<Decimal>()
        .map_err(|e| Error::Internal(format!("Invalid rating_average format: {}", e)))?;
    let rating_count: i32 = row.get("rating_count");

    Ok(Account {
        id: row.get("id"),
        username: row.get("username"),
        balance: parse_amount(row, "balance")?,
        total_spent: parse_amount(row, "total_spent")?,
        total_earned: parse_amount(row, "total_earned")?,
        rating: common::model::account::RatingSummary {
            average: rating_average,
            count: rating_count as u32,
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn insert_account(&self, account: Account) -> Result<Account> {
        debug!("Creating new account in database: {}", account.username);

        sqlx::query(
            "INSERT INTO accounts
                (id, username, balance, total_spent, total_earned,
                 rating_average, rating_count, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(account.balance.to_string())
        .bind(account.total_spent.to_string())
        .bind(account.total_earned.to_string())
        .bind(account.rating.average.to_string())
        .bind(account.rating.count as i32)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let row = sqlx::query(
            "SELECT id, username, balance, total_spent, total_earned,
                    rating_average, rating_count, created_at, updated_at
             FROM accounts WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            "SELECT id, username, balance, total_spent, total_earned,
                    rating_average, rating_count, created_at, updated_at
             FROM accounts WHERE username = $1"
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_account(&self, account: Account) -> Result<Account> {
        debug!("Updating account in database: {}", account.id);

        let result = sqlx::query(
            "UPDATE accounts SET
                balance = $2,
                total_spent = $3,
                total_earned = $4,
                rating_average = $5,
                rating_count = $6,
                updated_at = $7
             WHERE id = $1"
        )
        .bind(account.id)
        .bind(account.balance.to_string())
        .bind(account.total_spent.to_string())
        .bind(account.total_earned.to_string())
        .bind(account.rating.average.to_string())
        .bind(account.rating.count as i32)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AccountNotFound(format!("Account not found: {}", account.id)));
        }

        Ok(account)
    }
}
