use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred. Pool checkout timeouts surface here as
    /// well, because the pool carries an acquire timeout instead of
    /// blocking indefinitely.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The targeted row does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// A backend failure that is not a SQL error. Used by the in-memory
    /// store, including its fault-injection hooks.
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
