use async_trait::async_trait;

use crate::Result;
use crate::records::{Customer, OrderReportRow, Product, ProductPatch};

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// The stock row had at least the requested amount and was reduced.
    Applied,
    /// The stock row had less than the requested amount; nothing changed.
    Insufficient,
}

/// Hands out connection-scoped transactions for order placement.
///
/// Implementations must guarantee that a transaction's connection is
/// returned to its pool exactly once on every exit path, including when
/// the transaction value is dropped without an explicit `commit` or
/// `rollback`.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    type Tx: OrderTx;

    /// Checks out a connection and begins a transaction on it.
    ///
    /// Must not block indefinitely on an exhausted pool; checkout
    /// failures and timeouts surface as errors.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// A single in-flight order-placement transaction.
///
/// Writes issued through this handle become visible to other connections
/// only after `commit`. `commit` and `rollback` consume the handle, so a
/// terminated transaction cannot be re-entered.
#[async_trait]
pub trait OrderTx: Send {
    /// Inserts the order header with today's date and returns the
    /// store-generated order id.
    async fn insert_order(&mut self, customer_id: i32, status: &str) -> Result<i32>;

    /// Reduces a product's stock by `amount` only if at least `amount`
    /// is available, as one atomic check-and-apply on the product row.
    /// The row lock taken here is the serialization point between
    /// concurrent orders for the same product.
    async fn decrement_stock(&mut self, product_id: i32, amount: i32)
    -> Result<DecrementOutcome>;

    /// Inserts one line item referencing an order header created earlier
    /// in this transaction.
    async fn insert_line_item(
        &mut self,
        order_id: i32,
        product_id: i32,
        quantity: i32,
        price_at_purchase: f64,
    ) -> Result<()>;

    /// Makes every write in this transaction durable as one unit.
    async fn commit(self) -> Result<()>;

    /// Discards every write in this transaction.
    async fn rollback(self) -> Result<()>;
}

/// Plain create/read/update/delete access for the pass-through endpoints,
/// plus the read-only order report.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>>;

    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Replaces a product's attributes. Fails with `NotFound` when no row
    /// matches the id.
    async fn update_product(&self, id: i32, patch: &ProductPatch) -> Result<Product>;

    /// Deletes a product. Fails with `NotFound` when no row matches.
    async fn delete_product(&self, id: i32) -> Result<()>;

    async fn list_customers(&self) -> Result<Vec<Customer>>;

    /// The reporting join across orders, line items, products and
    /// customers: one row per order/product pair with summed quantity and
    /// extended price, ordered by order id ascending. Reads whatever is
    /// currently committed; no interaction with in-flight placements.
    async fn order_report(&self) -> Result<Vec<OrderReportRow>>;
}
