use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalog product with its available stock.
///
/// `quantity` never goes negative: the only write path that lowers it is
/// the conditional decrement in [`crate::OrderTx::decrement_stock`], and
/// the schema carries a `CHECK (quantity >= 0)` backstop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub quantity: i32,
}

/// Replacement attributes for an existing product (PUT body; the id comes
/// from the path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub quantity: i32,
}

/// A customer profile. Opaque to order placement beyond its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// One row of the order report: an order/product pair with summed
/// quantity and extended price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderReportRow {
    pub id: i32,
    pub customer_name: String,
    pub product_name: String,
    pub date_created: NaiveDate,
    pub total_quantity: i64,
    pub total_price: f64,
}
