//! Integration tests for the HTTP boundary, served over the fully wired
//! in-memory system.

mod support;

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

use payment::MockPaymentGateway;
use support::{System, seed_product, wire};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn app(system: &System) -> axum::Router {
    let state = Arc::new(api::AppState {
        order_service: system.order_service.clone(),
        analytics: system.analytics.clone(),
    });
    api::create_app(state, metrics_handle())
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn place_order_body(product_id: &str, quantity: u32) -> String {
    serde_json::json!({
        "items": [{
            "product_id": product_id,
            "product_name": "Widget",
            "quantity": quantity,
            "unit_price_cents": 1000,
        }]
    })
    .to_string()
}

#[tokio::test]
async fn health_check() {
    let system = wire(MockPaymentGateway::always_approve());
    let response = app(&system)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn place_order_runs_the_saga_to_confirmed() {
    let system = wire(MockPaymentGateway::always_approve());
    let product_id = seed_product(&system, 10).await;
    let app = app(&system);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from(place_order_body(&product_id.to_string(), 2)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["total_cents"], 2000);
    let order_id = body["order_id"].as_str().unwrap().to_string();

    // The whole chain ran inline on the in-memory bus.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Confirmed");
    assert!(body["reservation_id"].is_string());

    // Audit history with versions 1..4.
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}/events"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0]["event_type"], "OrderPlaced");
    assert_eq!(events[0]["version"], 1);
    assert_eq!(events[3]["event_type"], "OrderConfirmed");
    assert_eq!(events[3]["version"], 4);
}

#[tokio::test]
async fn empty_order_is_a_bad_request() {
    let system = wire(MockPaymentGateway::always_approve());

    let response = app(&system)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"items": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("at least one item"));

    // Nothing entered the event chain.
    assert!(system.bus.published().is_empty());
}

#[tokio::test]
async fn malformed_product_id_is_a_bad_request() {
    let system = wire(MockPaymentGateway::always_approve());

    let response = app(&system)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from(place_order_body("not-a-uuid", 1)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let system = wire(MockPaymentGateway::always_approve());

    let response = app(&system)
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn customer_orders_and_analytics() {
    let system = wire(MockPaymentGateway::always_approve());
    let product_id = seed_product(&system, 10).await;
    let customer_id = uuid::Uuid::new_v4();
    let app = app(&system);

    let body = serde_json::json!({
        "customer_id": customer_id.to_string(),
        "items": [{
            "product_id": product_id.to_string(),
            "product_name": "Widget",
            "quantity": 1,
            "unit_price_cents": 5000,
        }]
    })
    .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/customers/{customer_id}/orders"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/analytics/orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["orders_placed"], 1);
    assert_eq!(body["orders_confirmed"], 1);
    assert_eq!(body["gross_revenue_cents"], 5000);
}

#[tokio::test]
async fn prometheus_metrics_are_served() {
    let system = wire(MockPaymentGateway::always_approve());

    let response = app(&system)
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
