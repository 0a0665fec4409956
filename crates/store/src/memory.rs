use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::gateway::{DecrementOutcome, OrderTx, RecordStore, StoreGateway};
use crate::records::{Customer, OrderReportRow, Product, ProductPatch};
use crate::{Result, StoreError};

#[derive(Debug, Clone)]
struct OrderRow {
    id: i32,
    customer_id: i32,
    #[allow(dead_code)]
    status: String,
    date_created: NaiveDate,
}

#[derive(Debug, Clone)]
struct LineItemRow {
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price_at_purchase: f64,
}

#[derive(Debug, Clone, Default)]
struct MemState {
    products: HashMap<i32, Product>,
    customers: HashMap<i32, Customer>,
    orders: Vec<OrderRow>,
    line_items: Vec<LineItemRow>,
    next_order_id: i32,
}

/// Fault-injection switches. Kept outside the transactional state so a
/// rollback does not rewind them.
#[derive(Debug, Default)]
struct Faults {
    fail_on_insert_order: bool,
    fail_on_commit: bool,
    /// Fails the nth line-item insert from now (1 = the next one).
    fail_line_item_insert: Option<u32>,
}

/// In-memory store implementation for testing.
///
/// Provides the same gateway and CRUD interface as the PostgreSQL
/// implementation. A transaction holds the store-wide lock for its
/// lifetime, which coarsely models the row locking that serializes
/// concurrent decrements of the same product: of two racing placements,
/// one runs to completion before the other begins.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<AsyncMutex<MemState>>,
    faults: Arc<Mutex<Faults>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a customer row (there is no customer-creation endpoint).
    pub async fn seed_customer(&self, customer: Customer) {
        self.state
            .lock()
            .await
            .customers
            .insert(customer.id, customer);
    }

    /// Configures the store to fail the next order-header insert.
    pub fn set_fail_on_insert_order(&self, fail: bool) {
        self.faults.lock().unwrap().fail_on_insert_order = fail;
    }

    /// Configures the store to fail the nth line-item insert from now
    /// (1 = the very next insert; 0 is treated as 1). The switch clears
    /// once it fires.
    pub fn set_fail_line_item_insert(&self, nth: u32) {
        self.faults.lock().unwrap().fail_line_item_insert = Some(nth.max(1));
    }

    /// Configures the store to fail the next commit. The transaction's
    /// writes are discarded, as a failed commit persists nothing.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.faults.lock().unwrap().fail_on_commit = fail;
    }

    /// Returns a product's current stock, if the product exists.
    pub async fn product_quantity(&self, product_id: i32) -> Option<i32> {
        self.state
            .lock()
            .await
            .products
            .get(&product_id)
            .map(|p| p.quantity)
    }

    /// Returns the number of committed order headers.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Returns the number of committed line items.
    pub async fn line_item_count(&self) -> usize {
        self.state.lock().await.line_items.len()
    }

    /// Returns `(product_id, quantity, price_at_purchase)` for each line
    /// item of an order, in insertion order.
    pub async fn line_items(&self, order_id: i32) -> Vec<(i32, i32, f64)> {
        self.state
            .lock()
            .await
            .line_items
            .iter()
            .filter(|li| li.order_id == order_id)
            .map(|li| (li.product_id, li.quantity, li.price_at_purchase))
            .collect()
    }
}

/// An open in-memory transaction.
///
/// Holds the store lock and a snapshot of the pre-transaction state;
/// dropping the handle without committing restores the snapshot, so an
/// abandoned transaction can never leak partial writes.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<MemState>,
    snapshot: Option<MemState>,
    faults: Arc<Mutex<Faults>>,
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl StoreGateway for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = Some(guard.clone());
        Ok(InMemoryTx {
            guard,
            snapshot,
            faults: self.faults.clone(),
        })
    }
}

#[async_trait]
impl OrderTx for InMemoryTx {
    async fn insert_order(&mut self, customer_id: i32, status: &str) -> Result<i32> {
        if self.faults.lock().unwrap().fail_on_insert_order {
            return Err(StoreError::Backend(
                "injected failure on order insert".to_string(),
            ));
        }

        self.guard.next_order_id += 1;
        let id = self.guard.next_order_id;
        self.guard.orders.push(OrderRow {
            id,
            customer_id,
            status: status.to_string(),
            date_created: Utc::now().date_naive(),
        });
        Ok(id)
    }

    async fn decrement_stock(
        &mut self,
        product_id: i32,
        amount: i32,
    ) -> Result<DecrementOutcome> {
        match self.guard.products.get_mut(&product_id) {
            Some(product) if product.quantity >= amount => {
                product.quantity -= amount;
                Ok(DecrementOutcome::Applied)
            }
            // A missing row and a short row are the same outcome the SQL
            // conditional write produces: zero rows affected.
            _ => Ok(DecrementOutcome::Insufficient),
        }
    }

    async fn insert_line_item(
        &mut self,
        order_id: i32,
        product_id: i32,
        quantity: i32,
        price_at_purchase: f64,
    ) -> Result<()> {
        {
            let mut faults = self.faults.lock().unwrap();
            if let Some(countdown) = faults.fail_line_item_insert.as_mut() {
                *countdown -= 1;
                if *countdown == 0 {
                    faults.fail_line_item_insert = None;
                    return Err(StoreError::Backend(
                        "injected failure on line-item insert".to_string(),
                    ));
                }
            }
        }

        self.guard.line_items.push(LineItemRow {
            order_id,
            product_id,
            quantity,
            price_at_purchase,
        });
        Ok(())
    }

    async fn commit(mut self) -> Result<()> {
        if self.faults.lock().unwrap().fail_on_commit {
            // A failed commit persists nothing; the drop guard restores
            // the snapshot.
            return Err(StoreError::Backend(
                "injected failure on commit".to_string(),
            ));
        }
        // Discard the snapshot; the writes in place become the state.
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(mut self) -> Result<()> {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::Backend(format!(
                "duplicate product id {}",
                product.id
            )));
        }
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, id: i32, patch: &ProductPatch) -> Result<Product> {
        let mut state = self.state.lock().await;
        let product = state.products.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "product",
            id,
        })?;

        product.name = patch.name.clone();
        product.price = patch.price;
        product.category = patch.category.clone();
        product.quantity = patch.quantity;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: i32) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                entity: "product",
                id,
            })
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let state = self.state.lock().await;
        let mut customers: Vec<_> = state.customers.values().cloned().collect();
        customers.sort_by_key(|c| c.id);
        Ok(customers)
    }

    async fn order_report(&self) -> Result<Vec<OrderReportRow>> {
        let state = self.state.lock().await;

        // Group line items by (order, product), summing quantity and
        // extended price, inner-join semantics throughout.
        let mut grouped: HashMap<(i32, i32), (i64, f64)> = HashMap::new();
        for li in &state.line_items {
            let entry = grouped.entry((li.order_id, li.product_id)).or_default();
            entry.0 += i64::from(li.quantity);
            entry.1 += li.price_at_purchase * f64::from(li.quantity);
        }

        let mut rows = Vec::new();
        for ((order_id, product_id), (total_quantity, total_price)) in grouped {
            let Some(order) = state.orders.iter().find(|o| o.id == order_id) else {
                continue;
            };
            let Some(product) = state.products.get(&product_id) else {
                continue;
            };
            let Some(customer) = state.customers.get(&order.customer_id) else {
                continue;
            };
            rows.push(OrderReportRow {
                id: order_id,
                customer_name: customer.name.clone(),
                product_name: product.name.clone(),
                date_created: order.date_created,
                total_quantity,
                total_price,
            });
        }

        rows.sort_by(|a, b| a.id.cmp(&b.id).then(a.product_name.cmp(&b.product_name)));
        Ok(rows)
    }
}
