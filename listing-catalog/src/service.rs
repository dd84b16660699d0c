//! Listing catalog service implementation

use std::sync::Arc;

use common::decimal::{Amount, Price};
use common::error::{Error, Result, ErrorExt};
use common::model::listing::{Category, Listing};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::repository::{
    InMemoryListingRepository, ListingPage, ListingRepository, PostgresListingRepository,
};

/// Default page size for catalog queries
const DEFAULT_PAGE_LIMIT: usize = 20;
/// Upper bound on page size
const MAX_PAGE_LIMIT: usize = 100;

/// Fields supplied by a seller when creating a listing
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub price: Price,
}

/// Pagination and filter parameters for catalog queries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub category: Option<Category>,
}

impl ListingQuery {
    /// Resolve the page/limit pair to an offset and clamped limit
    pub fn to_offset_limit(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        ((page - 1) * limit, limit)
    }
}

/// Repository type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

/// Listing catalog service.
///
/// Owns listing records and their counters. Prices are immutable after
/// creation and listings are only ever soft-deleted, so trades can safely
/// keep referring to them.
pub struct ListingService {
    /// Repository for listing data
    repo: Arc<dyn ListingRepository>,
}

impl ListingService {
    /// Create a new listing service backed by the in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryListingRepository::new()),
        }
    }

    /// Create a new listing service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn ListingRepository> = match repo_type {
            RepositoryType::InMemory => {
                Arc::new(InMemoryListingRepository::new())
            },
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresListingRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo })
    }

    /// Create a new listing service over an existing repository
    pub fn with_shared_repository(repo: Arc<dyn ListingRepository>) -> Self {
        Self { repo }
    }

    /// Create a new listing for a seller
    pub async fn create_listing(&self, seller_id: Uuid, fields: NewListing) -> Result<Listing> {
        let title = fields.title.trim();
        if title.is_empty() || title.len() > 200 {
            return Err(Error::ValidationError(
                "Title must be between 1 and 200 characters".to_string(),
            ));
        }

        if fields.price < Amount::ZERO {
            return Err(Error::ValidationError(format!(
                "Price must be non-negative: {}", fields.price
            )));
        }

        info!("Creating listing '{}' for seller {}", title, seller_id);

        let listing = Listing::new(
            seller_id,
            title.to_string(),
            fields.description,
            fields.category,
            fields.price,
        );

        self.repo.insert_listing(listing).await
    }

    /// Get a listing by ID, active or not
    pub async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
        self.repo.get_listing(id).await
    }

    /// Get a listing that can currently be purchased.
    ///
    /// A missing and a deactivated listing are indistinguishable to callers;
    /// both surface as not-found.
    pub async fn find_active(&self, id: Uuid) -> Result<Listing> {
        match self.repo.get_listing(id).await? {
            Some(listing) if listing.is_active => Ok(listing),
            _ => Err(Error::ListingNotFound(format!(
                "Listing not found or inactive: {}", id
            ))),
        }
    }

    /// Increment the completed-purchase counter of a listing
    pub async fn increment_purchase_count(&self, id: Uuid) -> Result<Listing> {
        let mut listing = self.repo.get_listing(id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", id)))?;

        listing.purchases += 1;
        listing.updated_at = chrono::Utc::now();

        self.repo.update_listing(listing).await
            .with_context(|| format!("Failed to update purchase count for listing {}", id))
    }

    /// Record a view of a listing
    pub async fn record_view(&self, id: Uuid) -> Result<Listing> {
        let mut listing = self.repo.get_listing(id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", id)))?;

        listing.views += 1;
        listing.updated_at = chrono::Utc::now();

        self.repo.update_listing(listing).await
    }

    /// Deactivate a listing (soft delete); only the seller may do this
    pub async fn deactivate(&self, id: Uuid, requester_id: Uuid) -> Result<Listing> {
        let mut listing = self.repo.get_listing(id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", id)))?;

        if listing.seller_id != requester_id {
            return Err(Error::AuthorizationError(
                "Only the seller can deactivate a listing".to_string(),
            ));
        }

        debug!("Deactivating listing {}", id);

        listing.is_active = false;
        listing.updated_at = chrono::Utc::now();

        self.repo.update_listing(listing).await
    }

    /// List active listings, newest first
    pub async fn list_active(&self, query: &ListingQuery) -> Result<ListingPage> {
        let (offset, limit) = query.to_offset_limit();
        self.repo.list_active(query.category, offset, limit).await
    }

    /// List a seller's listings, newest first, including inactive ones
    pub async fn list_by_seller(&self, seller_id: Uuid, query: &ListingQuery) -> Result<ListingPage> {
        let (offset, limit) = query.to_offset_limit();
        self.repo.list_by_seller(seller_id, offset, limit).await
    }
}
