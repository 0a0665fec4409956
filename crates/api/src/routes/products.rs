//! Product CRUD pass-through endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use store::{Product, ProductPatch, RecordStore, StoreGateway};

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct ProductUpdatedResponse {
    pub message: &'static str,
    pub product: Product,
}

/// GET /products — all products.
#[tracing::instrument(skip(state))]
pub async fn list<S: StoreGateway + RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list_products().await?;
    Ok(Json(products))
}

/// POST /product — insert a product.
#[tracing::instrument(skip(state, product), fields(product_id = product.id))]
pub async fn create<S: StoreGateway + RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(product): Json<Product>,
) -> Result<Json<Product>, ApiError> {
    state.store.insert_product(&product).await?;
    Ok(Json(product))
}

/// PUT /product/{id} — replace a product's attributes; 404 when no row
/// matches the id.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: StoreGateway + RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i32>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductUpdatedResponse>, ApiError> {
    let product = state.store.update_product(id, &patch).await?;
    Ok(Json(ProductUpdatedResponse {
        message: "Product updated successfully",
        product,
    }))
}

/// DELETE /product/{id} — delete a product; 404 when no row matches.
#[tracing::instrument(skip(state))]
pub async fn remove<S: StoreGateway + RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete_product(id).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted",
    }))
}
