//! HTTP command/query boundary for the order-processing system.
//!
//! The API fronts the order service only; inventory, payment and
//! notification have no synchronous surface, they exist on the bus. The
//! analytics read side is exposed for the metrics query.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::place))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/events", get(routes::orders::events))
        .route("/customers/{id}/orders", get(routes::orders::customer_orders))
        .route("/analytics/orders", get(routes::analytics::orders))
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
