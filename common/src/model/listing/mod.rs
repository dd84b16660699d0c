//! Listing models and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Price;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Listing category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum Category {
    Business,
    Investment,
    Technology,
    Education,
    Lifestyle,
    Other,
}

impl Category {
    /// Stable string form used for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Investment => "investment",
            Category::Technology => "technology",
            Category::Education => "education",
            Category::Lifestyle => "lifestyle",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "business" => Ok(Category::Business),
            "investment" => Ok(Category::Investment),
            "technology" => Ok(Category::Technology),
            "education" => Ok(Category::Education),
            "lifestyle" => Ok(Category::Lifestyle),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// Listing model: a priced information item offered by a seller.
///
/// The price is immutable once the listing is created; no update operation
/// exists for it, so trades referencing the listing can snapshot it safely.
/// Listings are soft-deleted via the active flag and never removed while
/// trades reference them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Listing {
    /// Unique listing ID
    pub id: Uuid,
    /// Seller account ID (owner)
    pub seller_id: Uuid,
    /// Title
    pub title: String,
    /// Description of the offered information
    pub description: String,
    /// Category
    pub category: Category,
    /// Price (non-negative)
    pub price: Price,
    /// Whether the listing can currently be purchased
    pub is_active: bool,
    /// View counter
    pub views: u64,
    /// Number of completed purchases
    pub purchases: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a new active listing
    pub fn new(
        seller_id: Uuid,
        title: String,
        description: String,
        category: Category,
        price: Price,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            seller_id,
            title,
            description,
            category,
            price,
            is_active: true,
            views: 0,
            purchases: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Short listing representation attached to trade detail responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ListingSummary {
    /// Listing ID
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Category
    pub category: Category,
    /// Listed price
    pub price: Price,
}

impl From<&Listing> for ListingSummary {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id,
            title: listing.title.clone(),
            category: listing.category,
            price: listing.price,
        }
    }
}
