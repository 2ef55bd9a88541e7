//! Core error types for weekboard-core.
//!
//! This module defines the error hierarchy using thiserror, grouping
//! failures by the subsystem they originate from (store, auth, config,
//! validation) so callers can match on what actually went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for weekboard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication / session errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Document-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Schema migration failed
    #[error("Store migration failed: {0}")]
    MigrationFailed(String),

    /// Query or mutation failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Document lookup failed
    #[error("No document '{id}' in collection '{collection}'")]
    NotFound { collection: String, id: String },

    /// Store cannot be reached
    #[error("Store unavailable")]
    Unavailable,

    /// Live subscription was closed by the store
    #[error("Subscription closed")]
    SubscriptionClosed,

    /// A delivered document did not match the expected shape
    #[error("Malformed document in '{collection}': {message}")]
    Decode { collection: String, message: String },
}

/// Identity / session errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The provided session token was rejected
    #[error("Session token rejected: {0}")]
    TokenRejected(String),

    /// The persisted anonymous identity could not be read or written
    #[error("Identity file error at {path}: {source}")]
    IdentityFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted identity content is not valid
    #[error("Invalid persisted identity: {0}")]
    InvalidIdentity(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The data directory could not be created
    #[error("Cannot prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required text field was empty after trimming
    #[error("'{field}' must not be empty")]
    EmptyField { field: String },

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    /// A week identifier string could not be parsed
    #[error("Invalid week identifier '{0}'")]
    InvalidWeekId(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Unavailable
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
