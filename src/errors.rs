//! Error types for the client core.
//!
//! Remote failures (`ApiError`) are demoted to the local fallback by
//! `FallbackPolicy` and never reach the surfaces; the other enums are what a
//! caller actually observes.

use thiserror::Error;

/// Failures of the persisted key/value layer (Sled + Serde)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("no sweet id left after {0}")]
    IdsExhausted(u64),
}

/// Failures talking to the REST collaborator
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },
    /// 401 from the collaborator; the session has already been cleared.
    #[error("authorization expired, please log in again")]
    AuthorizationExpired,
    #[error("unexpected response body: {0}")]
    Decode(String),
    /// No remote configured (offline mode)
    #[error("remote API unavailable")]
    Unavailable,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User already exists with this username or email")]
    DuplicateUser,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("sweet {0} not found")]
    NotFound(u64),
    #[error("Insufficient stock for this purchase.")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("Please enter a valid quantity")]
    InvalidQuantity,
    #[error("admin role required")]
    Forbidden,
    #[error("please log in first")]
    Unauthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Registration form rule violation, shown to the user as-is
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);
