use thiserror::Error;

use crate::Collection;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// An insert or upsert would violate a unique field constraint.
    #[error("Duplicate value for unique field {field} in collection {collection}")]
    DuplicateKey {
        collection: Collection,
        field: String,
    },

    /// A `$set` path cannot be applied to the stored document.
    #[error("Cannot update path {path}: {reason}")]
    InvalidUpdate { path: String, reason: String },

    /// A database or network error reported by the driver.
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// A request body could not be converted into a BSON document.
    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocumentStoreError>;
