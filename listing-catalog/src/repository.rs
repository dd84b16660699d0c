//! Repository for listing data

use std::str::FromStr;

use async_trait::async_trait;
use common::decimal::Price;
use common::error::{Error, Result};
use common::model::listing::{Category, Listing};
use common::{DBTransaction, TransactionManager};
use common::db::{PgTransactionManager, InMemoryTransactionManager};
use dashmap::DashMap;
use sqlx::{PgPool, postgres::PgPoolOptions, postgres::PgRow, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Page of listings plus the total match count
pub type ListingPage = (Vec<Listing>, usize);

/// Listing repository trait defining the interface for listing storage
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Insert a new listing
    async fn insert_listing(&self, listing: Listing) -> Result<Listing>;

    /// Get a listing by ID, active or not
    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>>;

    /// Persist an updated listing record
    async fn update_listing(&self, listing: Listing) -> Result<Listing>;

    /// List active listings, newest first, optionally filtered by category
    async fn list_active(
        &self,
        category: Option<Category>,
        offset: usize,
        limit: usize,
    ) -> Result<ListingPage>;

    /// List a seller's listings, newest first
    async fn list_by_seller(&self, seller_id: Uuid, offset: usize, limit: usize) -> Result<ListingPage>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for listing data
pub struct InMemoryListingRepository {
    /// Listings by ID
    pub listings: DashMap<Uuid, Listing>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryListingRepository {
    /// Create a new in-memory listing repository
    pub fn new() -> Self {
        Self {
            listings: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }

    fn page_of(&self, mut matched: Vec<Listing>, offset: usize, limit: usize) -> ListingPage {
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matched.len();
        let page = matched.into_iter().skip(offset).take(limit).collect();
        (page, total)
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn insert_listing(&self, listing: Listing) -> Result<Listing> {
        self.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
        Ok(self.listings.get(&id).map(|l| l.clone()))
    }

    async fn update_listing(&self, listing: Listing) -> Result<Listing> {
        if !self.listings.contains_key(&listing.id) {
            return Err(Error::ListingNotFound(format!("Listing not found: {}", listing.id)));
        }

        self.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn list_active(
        &self,
        category: Option<Category>,
        offset: usize,
        limit: usize,
    ) -> Result<ListingPage> {
        let matched: Vec<Listing> = self.listings
            .iter()
            .filter(|entry| {
                let listing = entry.value();
                listing.is_active && category.map_or(true, |c| listing.category == c)
            })
            .map(|entry| entry.value().clone())
            .collect();

        Ok(self.page_of(matched, offset, limit))
    }

    async fn list_by_seller(&self, seller_id: Uuid, offset: usize, limit: usize) -> Result<ListingPage> {
        let matched: Vec<Listing> = self.listings
            .iter()
            .filter(|entry| entry.value().seller_id == seller_id)
            .map(|entry| entry.value().clone())
            .collect();

        Ok(self.page_of(matched, offset, limit))
    }
}

/// PostgreSQL repository for listing data
pub struct PostgresListingRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresListingRepository {
    /// Create a new PostgreSQL listing repository
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
}

const LISTING_COLUMNS: &str =
    "id, seller_id, title, description, category, price, is_active, views, purchases, created_at, updated_at";

/// Convert a listing row into the domain model
fn row_to_listing(row: &PgRow) -> Result<Listing> {
    let category_str: String = row.get("category");
    let category = Category::from_str(&category_str)
        .map_err(Error::Internal)?;

    let price_str: String = row.get("price");
    let price = price_str.parse::<Price>()
        .map_err(|e| Error::Internal(format!("Invalid price format: {}", e)))?;

    let views: i64 = row.get("views");
    let purchases: i64 = row.get("purchases");

    Ok(Listing {
        id: row.get("id"),
        seller_id: row.get("seller_id"),
        title: row.get("title"),
        description: row.get("description"),
        category,
        price,
        is_active: row.get("is_active"),
        views: views as u64,
        purchases: purchases as u64,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl ListingRepository for PostgresListingRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn insert_listing(&self, listing: Listing) -> Result<Listing> {
        debug!("Creating new listing in database: {}", listing.id);

        sqlx::query(
            "INSERT INTO listings
                (id, seller_id, title, description, category, price,
                 is_active, views, purchases, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        )
        .bind(listing.id)
        .bind(listing.seller_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.category.as_str())
        .bind(listing.price.to_string())
        .bind(listing.is_active)
        .bind(listing.views as i64)
        .bind(listing.purchases as i64)
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
        debug!("Getting listing from database: {}", id);

        let row = sqlx::query(
            &format!("SELECT {} FROM listings WHERE id = $1", LISTING_COLUMNS)
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_listing(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_listing(&self, listing: Listing) -> Result<Listing> {
        debug!("Updating listing in database: {}", listing.id);

        let result = sqlx::query(
            "UPDATE listings SET
                is_active = $2,
                views = $3,
                purchases = $4,
                updated_at = $5
             WHERE id = $1"
        )
        .bind(listing.id)
        .bind(listing.is_active)
        .bind(listing.views as i64)
        .bind(listing.purchases as i64)
        .bind(listing.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ListingNotFound(format!("Listing not found: {}", listing.id)));
        }

        Ok(listing)
    }

    async fn list_active(
        &self,
        category: Option<Category>,
        offset: usize,
        limit: usize,
    ) -> Result<ListingPage> {
        let category = category.map(|c| c.as_str().to_string());

        let rows = sqlx::query(
            &format!(
                "SELECT {} FROM listings
                 WHERE is_active = TRUE AND ($1::varchar IS NULL OR category = $1)
                 ORDER BY created_at DESC
                 LIMIT $2 OFFSET $3",
                LISTING_COLUMNS
            )
        )
        .bind(&category)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM listings
             WHERE is_active = TRUE AND ($1::varchar IS NULL OR category = $1)"
        )
        .bind(&category)
        .fetch_one(&self.pool)
        .await?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            listings.push(row_to_listing(&row)?);
        }

        Ok((listings, total as usize))
    }

    async fn list_by_seller(&self, seller_id: Uuid, offset: usize, limit: usize) -> Result<ListingPage> {
        let rows = sqlx::query(
            &format!(
                "SELECT {} FROM listings
                 WHERE seller_id = $1
                 ORDER BY created_at DESC
                 LIMIT $2 OFFSET $3",
                LISTING_COLUMNS
            )
        )
        .bind(seller_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM listings WHERE seller_id = $1"
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            listings.push(row_to_listing(&row)?);
        }

        Ok((listings, total as usize))
    }
}
