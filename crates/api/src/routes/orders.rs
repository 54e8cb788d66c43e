//! Order command and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use analytics::AnalyticsStore;
use order::{Order, OrderService, PlaceOrderItem};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub order_service: OrderService,
    pub analytics: AnalyticsStore,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
    pub total_cents: i64,
    pub placed_at: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub reservation_id: Option<String>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct EventResponse {
    pub event_id: String,
    pub event_type: String,
    pub version: i64,
    pub occurred_at: String,
    pub payload: serde_json::Value,
}

fn order_response(order: Order) -> OrderResponse {
    OrderResponse {
        id: order.id.to_string(),
        customer_id: order.customer_id.to_string(),
        status: order.status.to_string(),
        items: order
            .items
            .into_iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
            })
            .collect(),
        total_cents: order.total_amount.cents(),
        reservation_id: order.reservation_id.map(|id| id.to_string()),
    }
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("invalid {what}: {e}")))
}

// -- Handlers --

/// POST /orders — place a new order.
#[tracing::instrument(skip(state, req))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let customer_id = match req.customer_id {
        Some(ref raw) => CustomerId::from_uuid(parse_uuid(raw, "customer_id")?),
        None => CustomerId::new(),
    };

    let items = req
        .items
        .iter()
        .map(|item| {
            Ok(PlaceOrderItem {
                product_id: ProductId::from_uuid(parse_uuid(&item.product_id, "product_id")?),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: Money::from_cents(item.unit_price_cents),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let placed = state.order_service.place_order(customer_id, items).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedResponse {
            order_id: placed.order_id.to_string(),
            total_cents: placed.total_amount.cents(),
            placed_at: placed.placed_at.to_rfc3339(),
        }),
    ))
}

/// GET /orders/{id} — load an order by id.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&id, "order id")?);
    let order = state
        .order_service
        .get_order(order_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(order_response(order)))
}

/// GET /orders/{id}/events — the order's recorded event history.
#[tracing::instrument(skip(state))]
pub async fn events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&id, "order id")?);

    let events = state.order_service.order_events(order_id).await?;
    Ok(Json(
        events
            .into_iter()
            .map(|event| EventResponse {
                event_id: event.event_id.to_string(),
                event_type: event.event_type,
                version: event.version.as_i64(),
                occurred_at: event.occurred_at.to_rfc3339(),
                payload: event.payload,
            })
            .collect(),
    ))
}

/// GET /customers/{id}/orders — a customer's orders, oldest first.
#[tracing::instrument(skip(state))]
pub async fn customer_orders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let customer_id = CustomerId::from_uuid(parse_uuid(&id, "customer id")?);

    let orders = state.order_service.customer_orders(customer_id).await;
    Ok(Json(orders.into_iter().map(order_response).collect()))
}
