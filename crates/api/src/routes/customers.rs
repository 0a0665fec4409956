//! Customer read endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use store::{Customer, RecordStore, StoreGateway};

use crate::AppState;
use crate::error::ApiError;

/// GET /customers — all customers.
#[tracing::instrument(skip(state))]
pub async fn list<S: StoreGateway + RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = state.store.list_customers().await?;
    Ok(Json(customers))
}
