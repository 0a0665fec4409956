//! Order aggregate assembly for the response. Pure data shaping, no I/O.

use serde::Serialize;

use crate::request::NewOrder;

/// One persisted line item, as echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLine {
    pub product_id: i32,
    pub quantity: i32,
    pub price_at_purchase: f64,
}

/// The committed order: header plus its line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOrder {
    pub order_id: i32,
    pub customer_id: i32,
    pub status: String,
    pub lines: Vec<PlacedLine>,
}

/// The wire payload for a successful placement.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub success: bool,
    #[serde(rename = "orderId")]
    pub order_id: i32,
}

impl PlacedOrder {
    /// Assembles the in-memory result from the committed id and the
    /// request that produced it.
    pub fn assemble(order_id: i32, order: &NewOrder) -> Self {
        Self {
            order_id,
            customer_id: order.customer_id,
            status: order.status.clone(),
            lines: order
                .items
                .iter()
                .map(|line| PlacedLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price_at_purchase: line.price_at_purchase,
                })
                .collect(),
        }
    }

    /// The `{success: true, orderId}` response payload.
    pub fn receipt(&self) -> OrderReceipt {
        OrderReceipt {
            success: true,
            order_id: self.order_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::request::OrderLine;

    use super::*;

    #[test]
    fn assembles_one_line_per_item_in_order() {
        let order = NewOrder {
            customer_id: 7,
            status: "pending".to_string(),
            items: vec![
                OrderLine {
                    product_id: 3,
                    quantity: 2,
                    price_at_purchase: 9.99,
                },
                OrderLine {
                    product_id: 5,
                    quantity: 1,
                    price_at_purchase: 1.25,
                },
            ],
        };

        let placed = PlacedOrder::assemble(41, &order);
        assert_eq!(placed.order_id, 41);
        assert_eq!(placed.lines.len(), 2);
        assert_eq!(placed.lines[0].product_id, 3);
        assert_eq!(placed.lines[1].product_id, 5);

        let receipt = placed.receipt();
        assert!(receipt.success);
        assert_eq!(receipt.order_id, 41);
    }

    #[test]
    fn receipt_serializes_with_camel_case_order_id() {
        let receipt = OrderReceipt {
            success: true,
            order_id: 12,
        };
        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "orderId": 12}));
    }
}
