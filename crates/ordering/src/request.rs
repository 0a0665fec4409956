use serde::{Deserialize, Serialize};

use crate::error::{OrderError, Result};

/// One requested product within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i32,
    pub quantity: i32,
    /// Price captured at order time, decoupled from the product's
    /// current catalog price.
    pub price_at_purchase: f64,
}

/// A place-order request: customer, status, and the selected products in
/// caller-supplied order. Item order only affects the order in which row
/// locks are taken, never the outcome visible to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: i32,
    pub status: String,
    pub items: Vec<OrderLine>,
}

impl NewOrder {
    /// Checks the preconditions that must hold before any write: a
    /// non-empty item list, strictly positive quantities, non-negative
    /// prices.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(OrderError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }
        for line in &self.items {
            if line.quantity <= 0 {
                return Err(OrderError::Validation(format!(
                    "quantity for product {} must be positive, got {}",
                    line.product_id, line.quantity
                )));
            }
            if line.price_at_purchase < 0.0 {
                return Err(OrderError::Validation(format!(
                    "price for product {} must not be negative",
                    line.product_id
                )));
            }
        }
        Ok(())
    }
}
