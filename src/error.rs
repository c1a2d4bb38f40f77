//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Missing keys and tags are never errors: reads return `None` and
/// delete/clear are no-ops. Malformed keys and tags are accepted as-is.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be encoded or decoded
    #[error("Serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store rejected a read or write
    #[error("Storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
