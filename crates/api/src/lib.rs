//! HTTP API server for the inventory and orders service.
//!
//! Thin pass-through endpoints for products, customers and the order
//! report, plus the one endpoint with a real contract: `POST /orders`,
//! which runs the atomic place-order sequence. Structured logging via
//! `tracing` and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use ordering::OrderCoordinator;
use store::{RecordStore, StoreGateway};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: StoreGateway + RecordStore> {
    pub coordinator: OrderCoordinator<S>,
    pub store: S,
}

/// Creates the application state from a store handle. The store is an
/// explicitly passed dependency, so tests can substitute the in-memory
/// implementation.
pub fn create_state<S: StoreGateway + RecordStore + Clone>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        coordinator: OrderCoordinator::new(store.clone()),
        store,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StoreGateway + RecordStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/order", get(routes::orders::report::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/product", post(routes::products::create::<S>))
        .route(
            "/product/{id}",
            put(routes::products::update::<S>).delete(routes::products::remove::<S>),
        )
        .route("/customers", get(routes::customers::list::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
