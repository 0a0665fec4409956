use store::StoreError;
use thiserror::Error;

/// Errors that can terminate an order placement.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request failed its preconditions; nothing was written.
    #[error("Invalid order request: {0}")]
    Validation(String),

    /// A product had less stock than requested. An expected, frequent
    /// outcome under contention, not a defect.
    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: i32 },

    /// Connectivity, constraint, or other unexpected store failure.
    #[error("Persistence failure: {0}")]
    Store(#[from] StoreError),
}

/// Result type for order placement.
pub type Result<T> = std::result::Result<T, OrderError>;
