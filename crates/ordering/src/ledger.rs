//! The inventory ledger: contention-safe stock decrements.

use store::{DecrementOutcome, OrderTx};

use crate::error::{OrderError, Result};

/// Owns the "decrement stock if sufficient" primitive.
///
/// The decrement is a single conditional write evaluated and applied by
/// the store as one atomic step, never a read followed by a write. Two
/// placements racing for the last unit of a product therefore resolve to
/// exactly one success and one [`OrderError::InsufficientStock`]; no
/// amount is ever applied partially, and stock never goes negative.
pub struct InventoryLedger;

impl InventoryLedger {
    /// Reduces `product_id`'s stock by `amount` within the given
    /// transaction, or reports insufficient stock.
    pub async fn decrement<T: OrderTx>(tx: &mut T, product_id: i32, amount: i32) -> Result<()> {
        match tx.decrement_stock(product_id, amount).await? {
            DecrementOutcome::Applied => Ok(()),
            DecrementOutcome::Insufficient => Err(OrderError::InsufficientStock { product_id }),
        }
    }
}
