//! Error types for sitefinder

use std::time::Duration;

use thiserror::Error;

/// Result type alias for sitefinder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sitefinder operations
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load or run the embedding model
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The catalog store could not be reached or returned unusable data
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Fetching the catalog took longer than the configured bound
    #[error("catalog fetch timed out after {0:?}")]
    CatalogTimeout(Duration),

    /// A single stored record could not be interpreted
    #[error("malformed candidate: {0}")]
    MalformedCandidate(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A site with the same name is already in the catalog
    #[error("site already exists: {0}")]
    DuplicateSite(String),

    /// Failed to write to the catalog store
    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    /// Returns `true` if retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::CatalogTimeout(_))
    }
}
