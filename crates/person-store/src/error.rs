use thiserror::Error;

use crate::PersonId;

/// Errors that can occur when interacting with the person store.
#[derive(Debug, Error)]
pub enum PersonStoreError {
    /// The row to update or delete does not exist.
    #[error("Person not found: {0}")]
    NotFound(PersonId),

    /// Another row already holds this name.
    #[error("Person name already taken: {0}")]
    NameTaken(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The store rejected the operation for a reason of its own
    /// (used by the in-memory store to simulate outages).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for person store operations.
pub type Result<T> = std::result::Result<T, PersonStoreError>;
