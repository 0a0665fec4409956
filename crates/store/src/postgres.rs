use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::gateway::{DecrementOutcome, OrderTx, RecordStore, StoreGateway};
use crate::records::{Customer, OrderReportRow, Product, ProductPatch};
use crate::{Result, StoreError};

/// How long a checkout may wait for a pooled connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool with a bounded acquire timeout, so an
    /// exhausted pool fails the request instead of hanging it.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;
        tracing::info!(max_connections, "connected to Postgres");
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

/// An open Postgres transaction for one order placement.
///
/// If neither `commit` nor `rollback` runs (early return, panic), the
/// inner `sqlx::Transaction` aborts on drop and returns its connection to
/// the pool, so the connection is released exactly once on every path.
pub struct PgOrderTx {
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
}

#[async_trait]
impl StoreGateway for PostgresStore {
    type Tx = PgOrderTx;

    async fn begin(&self) -> Result<PgOrderTx> {
        let tx = self.pool.begin().await?;
        Ok(PgOrderTx { tx })
    }
}

#[async_trait]
impl OrderTx for PgOrderTx {
    async fn insert_order(&mut self, customer_id: i32, status: &str) -> Result<i32> {
        let order_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (customer_id, status, date_created)
            VALUES ($1, $2, CURRENT_DATE)
            RETURNING id
            "#,
        )
        .bind(customer_id)
        .bind(status)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(order_id)
    }

    async fn decrement_stock(
        &mut self,
        product_id: i32,
        amount: i32,
    ) -> Result<DecrementOutcome> {
        // Single conditional write: the check and the decrement are one
        // statement, evaluated under the product's row lock. Zero rows
        // affected means the stock was short, never silent success.
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - $1
            WHERE id = $2 AND quantity >= $1
            "#,
        )
        .bind(amount)
        .bind(product_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 1 {
            Ok(DecrementOutcome::Applied)
        } else {
            Ok(DecrementOutcome::Insufficient)
        }
    }

    async fn insert_line_item(
        &mut self,
        order_id: i32,
        product_id: i32,
        quantity: i32,
        price_at_purchase: f64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price_at_purchase)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, price, category, quantity FROM products ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, category, quantity)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_product(&self, id: i32, patch: &ProductPatch) -> Result<Product> {
        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $1, price = $2, category = $3, quantity = $4
            WHERE id = $5
            RETURNING id, name, price, category, quantity
            "#,
        )
        .bind(&patch.name)
        .bind(patch.price)
        .bind(&patch.category)
        .bind(patch.quantity)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(StoreError::NotFound {
            entity: "product",
            id,
        })
    }

    async fn delete_product(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "product",
                id,
            });
        }
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email FROM customers ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    async fn order_report(&self) -> Result<Vec<OrderReportRow>> {
        let rows = sqlx::query_as::<_, OrderReportRow>(
            r#"
            SELECT ord.id,
                   c.name AS customer_name,
                   p.name AS product_name,
                   ord.date_created,
                   SUM(oi.quantity)::BIGINT AS total_quantity,
                   SUM(oi.price_at_purchase * oi.quantity) AS total_price
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            JOIN orders ord ON ord.id = oi.order_id
            JOIN customers c ON c.id = ord.customer_id
            GROUP BY ord.id, c.name, p.name, ord.date_created
            ORDER BY ord.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
