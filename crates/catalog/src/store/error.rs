//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record ID is not a well-formed UUID.
    #[error("laptop ID is not a valid UUID: {id}: {source}")]
    InvalidId {
        /// The rejected ID
        id: String,
        /// Parser error
        #[source]
        source: uuid::Error,
    },

    /// A record with this ID already exists.
    #[error("record already exists: {id}")]
    AlreadyExists {
        /// The conflicting ID
        id: String,
    },

    /// A thread panicked while holding the store lock.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// A search consumer asked to stop.
    #[error("search aborted: {0}")]
    Aborted(String),
}

/// Convenience type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
