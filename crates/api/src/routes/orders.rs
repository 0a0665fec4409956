//! Order placement and the order report.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use ordering::{NewOrder, OrderLine, OrderReceipt};
use serde::Deserialize;
use store::{OrderReportRow, RecordStore, StoreGateway};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub customer_id: i32,
    pub status: String,
    pub selected_products: Vec<SelectedProduct>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedProduct {
    pub id: i32,
    pub order_quantity: i32,
    pub price: f64,
}

impl From<PlaceOrderRequest> for NewOrder {
    fn from(req: PlaceOrderRequest) -> Self {
        NewOrder {
            customer_id: req.customer_id,
            status: req.status,
            items: req
                .selected_products
                .into_iter()
                .map(|p| OrderLine {
                    product_id: p.id,
                    quantity: p.order_quantity,
                    price_at_purchase: p.price,
                })
                .collect(),
        }
    }
}

/// POST /orders — place an order atomically: header, line items and
/// stock decrements all commit or none do.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: StoreGateway + RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<OrderReceipt>, ApiError> {
    let order = NewOrder::from(req);
    let placed = state.coordinator.place_order(&order).await?;
    Ok(Json(placed.receipt()))
}

/// GET /order — the reporting join: one row per order/product with
/// summed quantity and extended price, ordered by order id ascending.
#[tracing::instrument(skip(state))]
pub async fn report<S: StoreGateway + RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderReportRow>>, ApiError> {
    let rows = state.store.order_report().await?;
    Ok(Json(rows))
}
