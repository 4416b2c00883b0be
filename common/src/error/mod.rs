//! Error types for the energy sharing platform
//!
//! This module provides a unified error handling system for all services
//! in the platform. It defines standard error types that can be used
//! across service boundaries and provides consistent error conversion.

use std::fmt::Display;
use thiserror::Error;

/// Platform error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error when a user cannot be found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Error when a username or email is already taken
    #[error("Duplicate user: {0}")]
    DuplicateUser(String),

    /// Error when an energy provider cannot be found
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Error when an energy request cannot be found
    #[error("Request not found: {0}")]
    RequestNotFound(String),

    /// Error when an energy transaction cannot be found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Error related to request or provider validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Authentication failure (bad credentials)
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

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
                Error::UserNotFound(msg) => Error::UserNotFound(format!("{}: {}", context, msg)),
                Error::DuplicateUser(msg) => Error::DuplicateUser(format!("{}: {}", context, msg)),
                Error::ProviderNotFound(msg) => Error::ProviderNotFound(format!("{}: {}", context, msg)),
                Error::RequestNotFound(msg) => Error::RequestNotFound(format!("{}: {}", context, msg)),
                Error::TransactionNotFound(msg) => Error::TransactionNotFound(format!("{}: {}", context, msg)),
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::InvalidCredentials(msg) => Error::InvalidCredentials(format!("{}: {}", context, msg)),
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
