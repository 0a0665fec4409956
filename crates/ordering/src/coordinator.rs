//! Transaction coordinator for the place-order sequence.

use store::{OrderTx, StoreGateway};

use crate::error::{OrderError, Result};
use crate::ledger::InventoryLedger;
use crate::receipt::PlacedOrder;
use crate::request::NewOrder;
use crate::rollback;

/// Step names for logs and metrics labels.
mod steps {
    pub const HEADER_INSERTED: &str = "header_inserted";
    pub const ITEM_PROCESSED: &str = "item_processed";
    pub const COMMITTED: &str = "committed";
    pub const ROLLED_BACK: &str = "rolled_back";
}

/// Orchestrates the all-or-nothing order placement sequence.
///
/// One placement checks out exactly one connection for the lifetime of
/// its transaction: insert the header, then per item a ledger decrement
/// followed by the line-item insert, then commit. Any failure at any
/// step aborts the whole transaction before the error is surfaced, so
/// the caller always sees exactly one terminal outcome and never a
/// partial order. The coordinator takes no locks of its own; the
/// ledger's conditional write is the sole serialization point between
/// placements contending for the same product.
///
/// Placement is deliberately not idempotent: submitting the same payload
/// twice creates two orders and decrements stock twice.
pub struct OrderCoordinator<G: StoreGateway> {
    gateway: G,
}

impl<G: StoreGateway> OrderCoordinator<G> {
    /// Creates a coordinator over the given persistence gateway.
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Places an order: on success exactly one order row, one line item
    /// per requested product, and the matching stock decrements are
    /// durable as one unit; on any error nothing is persisted.
    #[tracing::instrument(
        skip(self, order),
        fields(customer_id = order.customer_id, items = order.items.len())
    )]
    pub async fn place_order(&self, order: &NewOrder) -> Result<PlacedOrder> {
        order.validate()?;

        metrics::counter!("orders_attempted_total").increment(1);
        let started = std::time::Instant::now();

        let mut tx = self.gateway.begin().await?;

        // A failed commit takes the same rejection path as a failed
        // step; the gateway's drop guard has already aborted it.
        let result = match Self::run_steps(&mut tx, order).await {
            Ok(order_id) => tx
                .commit()
                .await
                .map(|()| order_id)
                .map_err(OrderError::from),
            Err(err) => {
                rollback::abort(tx, &err).await;
                Err(err)
            }
        };

        match result {
            Ok(order_id) => {
                metrics::histogram!("order_placement_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(order_id, step = steps::COMMITTED, "order placed");
                Ok(PlacedOrder::assemble(order_id, order))
            }
            Err(err) => {
                metrics::counter!("orders_rejected_total").increment(1);
                tracing::info!(error = %err, step = steps::ROLLED_BACK, "order placement aborted");
                Err(err)
            }
        }
    }

    /// The write sequence inside the transaction. Returns the generated
    /// order id; any error here leaves the abort decision to the caller.
    async fn run_steps<T: OrderTx>(tx: &mut T, order: &NewOrder) -> Result<i32> {
        let order_id = tx.insert_order(order.customer_id, &order.status).await?;
        tracing::debug!(order_id, step = steps::HEADER_INSERTED, "order header inserted");

        // Items in caller-supplied order; this fixes the lock acquisition
        // order, nothing more.
        for line in &order.items {
            InventoryLedger::decrement(tx, line.product_id, line.quantity).await?;
            tx.insert_line_item(
                order_id,
                line.product_id,
                line.quantity,
                line.price_at_purchase,
            )
            .await?;
            tracing::debug!(
                order_id,
                product_id = line.product_id,
                quantity = line.quantity,
                step = steps::ITEM_PROCESSED,
                "line item persisted"
            );
        }

        Ok(order_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use store::{Customer, InMemoryStore, Product, RecordStore, StoreError};

    use crate::request::OrderLine;

    use super::*;

    fn product(id: i32, quantity: i32) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            price: 9.99,
            category: "widgets".to_string(),
            quantity,
        }
    }

    fn line(product_id: i32, quantity: i32) -> OrderLine {
        OrderLine {
            product_id,
            quantity,
            price_at_purchase: 9.99,
        }
    }

    fn order(customer_id: i32, items: Vec<OrderLine>) -> NewOrder {
        NewOrder {
            customer_id,
            status: "pending".to_string(),
            items,
        }
    }

    async fn setup(products: &[(i32, i32)]) -> (OrderCoordinator<InMemoryStore>, InMemoryStore) {
        let store = InMemoryStore::new();
        for &(id, quantity) in products {
            store.insert_product(&product(id, quantity)).await.unwrap();
        }
        store
            .seed_customer(Customer {
                id: 7,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            })
            .await;
        (OrderCoordinator::new(store.clone()), store)
    }

    #[tokio::test]
    async fn happy_path_persists_header_lines_and_decrements() {
        let (coordinator, store) = setup(&[(3, 5), (4, 2)]).await;

        let placed = coordinator
            .place_order(&order(7, vec![line(3, 2), line(4, 1)]))
            .await
            .unwrap();

        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.product_quantity(3).await, Some(3));
        assert_eq!(store.product_quantity(4).await, Some(1));

        let items = store.line_items(placed.order_id).await;
        assert_eq!(items, vec![(3, 2, 9.99), (4, 1, 9.99)]);

        // Persisted quantities match requested quantities exactly.
        let requested: i32 = placed.lines.iter().map(|l| l.quantity).sum();
        let persisted: i32 = items.iter().map(|(_, q, _)| q).sum();
        assert_eq!(requested, persisted);
    }

    #[tokio::test]
    async fn insufficient_stock_aborts_whole_order() {
        let (coordinator, store) = setup(&[(3, 5), (4, 0)]).await;

        // Product 3 would succeed; product 4 is out of stock. Neither
        // line item may survive.
        let err = coordinator
            .place_order(&order(7, vec![line(3, 2), line(4, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InsufficientStock { product_id: 4 }
        ));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.line_item_count().await, 0);
        assert_eq!(store.product_quantity(3).await, Some(5));
        assert_eq!(store.product_quantity(4).await, Some(0));
    }

    #[tokio::test]
    async fn header_insert_failure_aborts_before_any_write() {
        let (coordinator, store) = setup(&[(3, 5)]).await;
        store.set_fail_on_insert_order(true);

        let err = coordinator
            .place_order(&order(7, vec![line(3, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Store(StoreError::Backend(_))));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.product_quantity(3).await, Some(5));
    }

    #[tokio::test]
    async fn failure_on_second_of_three_items_rolls_back_everything() {
        let (coordinator, store) = setup(&[(1, 5), (2, 5), (3, 5)]).await;
        store.set_fail_line_item_insert(2);

        let err = coordinator
            .place_order(&order(7, vec![line(1, 1), line(2, 1), line(3, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Store(StoreError::Backend(_))));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.line_item_count().await, 0);
        for id in [1, 2, 3] {
            assert_eq!(store.product_quantity(id).await, Some(5));
        }
    }

    #[tokio::test]
    async fn commit_failure_surfaces_as_rejection_with_nothing_persisted() {
        let (coordinator, store) = setup(&[(3, 5)]).await;
        store.set_fail_on_commit(true);

        let err = coordinator
            .place_order(&order(7, vec![line(3, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Store(StoreError::Backend(_))));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.line_item_count().await, 0);
        assert_eq!(store.product_quantity(3).await, Some(5));
    }

    #[tokio::test]
    async fn validation_failures_reject_before_any_write() {
        let (coordinator, store) = setup(&[(3, 5)]).await;

        let empty = coordinator.place_order(&order(7, vec![])).await;
        assert!(matches!(empty, Err(OrderError::Validation(_))));

        let zero_quantity = coordinator.place_order(&order(7, vec![line(3, 0)])).await;
        assert!(matches!(zero_quantity, Err(OrderError::Validation(_))));

        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.product_quantity(3).await, Some(5));
    }

    #[tokio::test]
    async fn unknown_product_reports_insufficient_stock() {
        let (coordinator, store) = setup(&[]).await;

        let err = coordinator
            .place_order(&order(7, vec![line(99, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InsufficientStock { product_id: 99 }
        ));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_submission_creates_two_orders() {
        let (coordinator, store) = setup(&[(3, 10)]).await;
        let request = order(7, vec![line(3, 2)]);

        let first = coordinator.place_order(&request).await.unwrap();
        let second = coordinator.place_order(&request).await.unwrap();

        // Placement is not idempotent: two distinct orders, double the
        // decrement.
        assert_ne!(first.order_id, second.order_id);
        assert_eq!(store.order_count().await, 2);
        assert_eq!(store.product_quantity(3).await, Some(6));
    }

    #[tokio::test]
    async fn concurrent_orders_for_last_units_resolve_to_one_winner() {
        let (coordinator, store) = setup(&[(3, 2)]).await;
        let coordinator = Arc::new(coordinator);

        let a = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.place_order(&order(7, vec![line(3, 2)])).await })
        };
        let b = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.place_order(&order(7, vec![line(3, 2)])).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(OrderError::InsufficientStock { product_id: 3 })
        )));

        assert_eq!(store.product_quantity(3).await, Some(0));
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.line_item_count().await, 1);
    }
}
