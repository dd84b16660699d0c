//! Listing catalog service for priced information items

pub mod service;
pub mod repository;

pub use service::{ListingService, NewListing, ListingQuery, RepositoryType};
pub use repository::{ListingRepository, InMemoryListingRepository, PostgresListingRepository};
