//! Error types for the blob store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in blob store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The envelope's embedded id does not match the store key it was
    /// submitted under.
    #[error("envelope id {actual} does not match store key {expected}")]
    IdMismatch { expected: String, actual: String },

    /// A record exists but cannot be decoded.
    #[error("stored record is unreadable: {0}")]
    Corrupt(String),

    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}
