//! Error types for the marketplace backend
//!
//! This module provides a unified error handling system for all services in
//! the marketplace. It defines standard error types that can be used across
//! service boundaries and provides consistent error conversion.
//!
//! The variants mirror the failure taxonomy of the settlement flow: every
//! precondition failure maps to exactly one variant, and a failed precondition
//! always aborts before any record is mutated.

use std::fmt::Display;
use thiserror::Error;

/// Marketplace error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input, rejected before touching any record
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error when an account has insufficient balance for a purchase
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Error when a listing cannot be found or is no longer active
    #[error("Listing not found: {0}")]
    ListingNotFound(String),

    /// Error when a trade cannot be found
    #[error("Trade not found: {0}")]
    TradeNotFound(String),

    /// Error when an account cannot be found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Caller is not a permitted party for the operation
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// Duplicate purchase, already-rated, or wrong status for a transition
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Refund requested outside the allowed time window
    #[error("Refund window expired: {0}")]
    RefundWindowExpired(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::InsufficientBalance(msg) => Error::InsufficientBalance(format!("{}: {}", context, msg)),
                Error::ListingNotFound(msg) => Error::ListingNotFound(format!("{}: {}", context, msg)),
                Error::TradeNotFound(msg) => Error::TradeNotFound(format!("{}: {}", context, msg)),
                Error::AccountNotFound(msg) => Error::AccountNotFound(format!("{}: {}", context, msg)),
                Error::AuthorizationError(msg) => Error::AuthorizationError(format!("{}: {}", context, msg)),
                Error::StateConflict(msg) => Error::StateConflict(format!("{}: {}", context, msg)),
                Error::RefundWindowExpired(msg) => Error::RefundWindowExpired(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
