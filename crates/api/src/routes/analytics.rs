//! Order-funnel metrics from the analytics service.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct OrderMetricsResponse {
    pub orders_placed: u64,
    pub orders_confirmed: u64,
    pub orders_cancelled: u64,
    pub payments_processed: u64,
    pub payments_failed: u64,
    pub gross_revenue_cents: i64,
    pub captured_revenue_cents: i64,
}

/// GET /analytics/orders — aggregated order metrics.
pub async fn orders(State(state): State<Arc<AppState>>) -> Json<OrderMetricsResponse> {
    let metrics = state.analytics.metrics();
    Json(OrderMetricsResponse {
        orders_placed: metrics.orders_placed,
        orders_confirmed: metrics.orders_confirmed,
        orders_cancelled: metrics.orders_cancelled,
        payments_processed: metrics.payments_processed,
        payments_failed: metrics.payments_failed,
        gross_revenue_cents: metrics.gross_revenue.cents(),
        captured_revenue_cents: metrics.captured_revenue.cents(),
    })
}
